use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use engine_logging::{engine_error, engine_info, engine_warn};

use crate::backend::{Backend, BackendSettings, ReqwestBackend};
use crate::{BackendReply, BackendRequest, EngineEvent, FailureKind, RequestError, RequestId};

enum EngineCommand {
    Submit {
        request_id: RequestId,
        request: BackendRequest,
    },
}

/// Runs backend requests on a dedicated tokio runtime and reports each one
/// back as exactly one [`EngineEvent::Completed`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(settings: BackendSettings) -> Result<Self, RequestError> {
        let backend = ReqwestBackend::new(settings)?;
        engine_info!("Engine targeting backend {}", backend.base_url());
        Ok(Self::with_backend(Arc::new(backend)))
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("Failed to start engine runtime: {}", err);
                    fail_all(cmd_rx, event_tx, &err.to_string());
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(backend.as_ref(), command, event_tx).await;
                });
            }
        });

        Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        }
    }

    pub fn submit(&self, request_id: RequestId, request: BackendRequest) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::Submit { request_id, request });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Blocks until the next completion. Holds the receiver lock while waiting.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv().ok()
    }
}

async fn handle_command(
    backend: &dyn Backend,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Submit {
            request_id,
            request,
        } => {
            match &request {
                BackendRequest::Ask { question, top_k } => engine_info!(
                    "Submit request_id={} ask question_len={} top_k={}",
                    request_id,
                    question.len(),
                    top_k
                ),
                other => engine_info!("Submit request_id={} {}", request_id, other.name()),
            }

            let guard = CompletionGuard::new(request_id, event_tx);
            let result = backend.execute(&request).await;
            if let Err(err) = &result {
                engine_warn!(
                    "Request {} ({}) failed: {}",
                    request_id,
                    request.name(),
                    err
                );
            }
            guard.complete(result);
        }
    }
}

/// Delivers the completion for one request. If the request task unwinds or
/// is dropped before `complete` runs, the drop path reports it as aborted so
/// the caller always leaves its in-flight state.
struct CompletionGuard {
    request_id: RequestId,
    event_tx: Option<mpsc::Sender<EngineEvent>>,
}

impl CompletionGuard {
    fn new(request_id: RequestId, event_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            request_id,
            event_tx: Some(event_tx),
        }
    }

    fn complete(mut self, result: Result<BackendReply, RequestError>) {
        if let Some(tx) = self.event_tx.take() {
            let _ = tx.send(EngineEvent::Completed {
                request_id: self.request_id,
                result,
            });
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.event_tx.take() {
            engine_error!("Request {} ended without a result", self.request_id);
            let _ = tx.send(EngineEvent::Completed {
                request_id: self.request_id,
                result: Err(RequestError::new(
                    FailureKind::Aborted,
                    "request task ended without a result",
                )),
            });
        }
    }
}

fn fail_all(
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    reason: &str,
) {
    while let Ok(EngineCommand::Submit { request_id, .. }) = cmd_rx.recv() {
        let _ = event_tx.send(EngineEvent::Completed {
            request_id,
            result: Err(RequestError::new(FailureKind::Aborted, reason)),
        });
    }
}
