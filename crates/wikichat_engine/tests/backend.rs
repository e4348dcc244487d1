use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wikichat_engine::{
    Answer, Backend, BackendReply, BackendRequest, BackendSettings, FailureKind, IndexStats,
    ReqwestBackend,
};
use wiremock::matchers::{body_json, body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer, download_dir: PathBuf) -> ReqwestBackend {
    ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        download_dir,
        ..BackendSettings::default()
    })
    .expect("backend")
}

#[tokio::test]
async fn ask_sends_question_and_top_k() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .and(body_json(json!({"q": "What is the refund policy?", "k": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "answer": "Refunds within 30 days.",
            "sources": ["policy.pdf p.2"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());
    let answer = backend
        .ask("What is the refund policy?", 5)
        .await
        .expect("answer");

    assert_eq!(
        answer,
        Answer {
            answer: "Refunds within 30 days.".to_string(),
            sources: vec!["policy.pdf p.2".to_string()],
        }
    );
}

#[tokio::test]
async fn ask_error_is_read_from_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"ok": false, "error": "Falta 'q'."})),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());
    let err = backend.ask(" ", 5).await.unwrap_err();

    assert_eq!(
        err.kind,
        FailureKind::Application {
            error: Some("Falta 'q'.".to_string())
        }
    );
}

#[tokio::test]
async fn non_json_reply_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/index"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Internal Server Error</html>"))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());
    let err = backend.index().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn index_reports_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/index"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "pages": 12, "chunks": 340})),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());
    let reply = backend.execute(&BackendRequest::Index).await.unwrap();
    assert_eq!(
        reply,
        BackendReply::Indexed(IndexStats {
            pages: 12,
            chunks: 340
        })
    );
}

#[tokio::test]
async fn upload_without_file_still_posts_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"pdf\""))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"ok": false, "error": "no file"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());
    let err = backend.upload(None).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::Application {
            error: Some("no file".to_string())
        }
    );
}

#[tokio::test]
async fn upload_sends_file_contents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("filename=\"manual.pdf\""))
        .and(body_string_contains("%PDF-1.4 test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "filename": "manual.pdf"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let pdf = temp.path().join("manual.pdf");
    std::fs::write(&pdf, "%PDF-1.4 test").unwrap();

    let backend = backend_for(&server, temp.path().to_path_buf());
    let filename = backend.upload(Some(&pdf)).await.unwrap();
    assert_eq!(filename.as_deref(), Some("manual.pdf"));
}

#[tokio::test]
async fn upload_of_missing_local_file_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());
    let err = backend
        .upload(Some(&temp.path().join("missing.pdf")))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Io);
}

#[tokio::test]
async fn wipe_and_import_return_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wipe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "msg": "Colección 'wiki_pdf' eliminada."
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/import"))
        .and(body_string_contains("name=\"zip\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "msg": "Índice importado correctamente. Volvé a preguntar."
        })))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("backup.zip");
    std::fs::write(&archive, b"PK\x05\x06").unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());

    assert_eq!(
        backend.wipe().await.unwrap(),
        "Colección 'wiki_pdf' eliminada."
    );
    assert_eq!(
        backend.import(Some(&archive)).await.unwrap(),
        "Índice importado correctamente. Volvé a preguntar."
    );
}

#[tokio::test]
async fn export_saves_archive() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/export"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"PK\x03\x04archive".to_vec(), "application/zip"),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let downloads = temp.path().join("downloads");
    let backend = backend_for(&server, downloads.clone());
    let saved = backend.export("chroma_index.zip").await.unwrap();

    assert_eq!(saved, downloads.join("chroma_index.zip"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"PK\x03\x04archive");
}

#[tokio::test]
async fn export_failure_status_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/export"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());
    let err = backend.export("chroma_index.zip").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert!(!temp.path().join("chroma_index.zip").exists());
}

#[tokio::test]
async fn health_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = backend_for(&server, temp.path().to_path_buf());
    backend.health().await.expect("healthy");
}

#[tokio::test]
async fn unreachable_server_is_network_failure() {
    // Nothing listens on a port released right after binding it.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let temp = TempDir::new().unwrap();
    let backend = ReqwestBackend::new(BackendSettings {
        base_url: uri,
        connect_timeout: Duration::from_millis(500),
        download_dir: temp.path().to_path_buf(),
        ..BackendSettings::default()
    })
    .unwrap();
    let err = backend.ask("hola", 5).await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
}

#[tokio::test]
async fn request_timeout_applies_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"ok": true, "answer": "tarde", "sources": []})),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let backend = ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        request_timeout: Some(Duration::from_millis(50)),
        download_dir: temp.path().to_path_buf(),
        ..BackendSettings::default()
    })
    .unwrap();
    let err = backend.ask("hola", 5).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}
