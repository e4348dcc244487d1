use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use crate::persist::ArchiveWriter;
use crate::wire::{
    ApiReply, AskBody, AskPayload, IndexPayload, MsgPayload, NoPayload, UploadPayload,
};
use crate::{Answer, BackendReply, BackendRequest, FailureKind, IndexStats, RequestError};

const UPLOAD_FIELD: &str = "pdf";
const IMPORT_FIELD: &str = "zip";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Whole-request limit. `None` leaves requests running until the
    /// transport resolves them; indexing a large corpus takes minutes.
    pub request_timeout: Option<Duration>,
    pub download_dir: PathBuf,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            download_dir: PathBuf::from("."),
        }
    }
}

/// The retrieval backend, one method per endpoint.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn ask(&self, question: &str, top_k: u32) -> Result<Answer, RequestError>;

    /// Uploads a PDF. With `None` an empty file part is sent, as a browser
    /// form does when nothing is selected.
    async fn upload(&self, file: Option<&Path>) -> Result<Option<String>, RequestError>;

    async fn index(&self) -> Result<IndexStats, RequestError>;

    async fn wipe(&self) -> Result<String, RequestError>;

    /// Downloads the index archive and saves it as `filename`; returns the saved path.
    async fn export(&self, filename: &str) -> Result<PathBuf, RequestError>;

    async fn import(&self, file: Option<&Path>) -> Result<String, RequestError>;

    async fn health(&self) -> Result<(), RequestError>;

    async fn execute(&self, request: &BackendRequest) -> Result<BackendReply, RequestError> {
        match request {
            BackendRequest::Ask { question, top_k } => {
                self.ask(question, *top_k).await.map(BackendReply::Answer)
            }
            BackendRequest::Upload { file } => self
                .upload(file.as_deref())
                .await
                .map(|filename| BackendReply::Uploaded { filename }),
            BackendRequest::Index => self.index().await.map(BackendReply::Indexed),
            BackendRequest::Wipe => self.wipe().await.map(|msg| BackendReply::Wiped { msg }),
            BackendRequest::Export { filename } => self
                .export(filename)
                .await
                .map(|path| BackendReply::Exported { path }),
            BackendRequest::Import { file } => self
                .import(file.as_deref())
                .await
                .map(|msg| BackendReply::Imported { msg }),
            BackendRequest::Health => self.health().await.map(|()| BackendReply::Healthy),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    base: Url,
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, RequestError> {
        let base = parse_base_url(&settings.base_url)?;
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| RequestError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            base,
            client,
            download_dir: settings.download_dir,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, RequestError> {
        self.base
            .join(path)
            .map_err(|err| RequestError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    /// Sends a request to a JSON endpoint and decodes the reply whatever the
    /// status; the backend reports `ok: false` with 4xx/5xx codes.
    async fn call_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RequestError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        engine_debug!("backend replied status={} bytes={}", status, body.len());

        let reply: ApiReply<T> = serde_json::from_slice(&body).map_err(|err| {
            engine_warn!("undecodable reply (status {}): {}", status, err);
            RequestError::new(
                FailureKind::InvalidResponse,
                format!("status {status}: {err}"),
            )
        })?;
        reply.into_result()
    }

    async fn file_form(
        &self,
        field: &'static str,
        file: Option<&Path>,
        mime: &str,
    ) -> Result<Form, RequestError> {
        let part = match file {
            Some(path) => {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|err| RequestError::new(FailureKind::Io, format!("{path:?}: {err}")))?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Part::bytes(data)
                    .file_name(name)
                    .mime_str(mime)
                    .map_err(map_reqwest_error)?
            }
            None => Part::bytes(Vec::new())
                .file_name(String::new())
                .mime_str("application/octet-stream")
                .map_err(map_reqwest_error)?,
        };
        Ok(Form::new().part(field, part))
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn ask(&self, question: &str, top_k: u32) -> Result<Answer, RequestError> {
        let url = self.endpoint("api/ask")?;
        let request = self.client.post(url).json(&AskBody {
            q: question,
            k: top_k,
        });
        let payload: AskPayload = self.call_json(request).await?;
        Ok(Answer {
            answer: payload.answer,
            sources: payload.sources,
        })
    }

    async fn upload(&self, file: Option<&Path>) -> Result<Option<String>, RequestError> {
        let url = self.endpoint("api/upload")?;
        let form = self.file_form(UPLOAD_FIELD, file, "application/pdf").await?;
        let payload: UploadPayload = self.call_json(self.client.post(url).multipart(form)).await?;
        Ok(payload.filename)
    }

    async fn index(&self) -> Result<IndexStats, RequestError> {
        let url = self.endpoint("api/index")?;
        let payload: IndexPayload = self.call_json(self.client.post(url)).await?;
        Ok(IndexStats {
            pages: payload.pages,
            chunks: payload.chunks,
        })
    }

    async fn wipe(&self) -> Result<String, RequestError> {
        let url = self.endpoint("api/wipe")?;
        let payload: MsgPayload = self.call_json(self.client.post(url)).await?;
        Ok(payload.msg)
    }

    async fn export(&self, filename: &str) -> Result<PathBuf, RequestError> {
        let url = self.endpoint("api/export")?;
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let archive = response.bytes().await.map_err(map_reqwest_error)?;
        engine_debug!("export archive received bytes={}", archive.len());

        let writer = ArchiveWriter::new(self.download_dir.clone());
        let filename = filename.to_string();
        tokio::task::spawn_blocking(move || writer.save(&filename, &archive))
            .await
            .map_err(|err| RequestError::new(FailureKind::Aborted, err.to_string()))?
            .map_err(|err| RequestError::new(FailureKind::Io, err.to_string()))
    }

    async fn import(&self, file: Option<&Path>) -> Result<String, RequestError> {
        let url = self.endpoint("api/import")?;
        let form = self.file_form(IMPORT_FIELD, file, "application/zip").await?;
        let payload: MsgPayload = self.call_json(self.client.post(url).multipart(form)).await?;
        Ok(payload.msg)
    }

    async fn health(&self) -> Result<(), RequestError> {
        let url = self.endpoint("healthz")?;
        let _: NoPayload = self.call_json(self.client.get(url)).await?;
        Ok(())
    }
}

/// Parses the server address, keeping any path prefix as the directory that
/// endpoint paths are resolved against.
fn parse_base_url(raw: &str) -> Result<Url, RequestError> {
    let mut base = Url::parse(raw.trim())
        .map_err(|err| RequestError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(RequestError::new(
            FailureKind::InvalidUrl,
            format!("{raw} cannot be used as a base url"),
        ));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn map_reqwest_error(err: reqwest::Error) -> RequestError {
    if err.is_timeout() {
        return RequestError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return RequestError::new(FailureKind::InvalidResponse, err.to_string());
    }
    RequestError::new(FailureKind::Network, err.to_string())
}
