use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use engine_logging::{engine_debug, engine_warn};
use wikichat_core::{Answer, Effect, Failure, Msg, OpsReply, RequestId};
use wikichat_engine::{BackendReply, BackendRequest, EngineEvent, EngineHandle, FailureKind};

use super::app::AppEvent;

/// Core request ids start at 1; the health probe uses its own slot.
const HEALTH_REQUEST_ID: RequestId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Ask,
    Ops,
    Health,
}

type Pending = Arc<Mutex<HashMap<RequestId, RequestKind>>>;

pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    pending: Pending,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, event_tx: mpsc::Sender<AppEvent>) -> Self {
        let runner = Self {
            engine: Arc::new(engine),
            pending: Arc::new(Mutex::new(HashMap::new())),
        };
        runner.spawn_event_loop(event_tx);
        runner
    }

    /// Submits a backend effect. Focus and confirmation are front-end concerns
    /// and are ignored here.
    pub fn run(&self, effect: Effect) {
        let (request_id, kind, request) = match effect {
            Effect::Ask {
                request_id,
                question,
                top_k,
            } => (
                request_id,
                RequestKind::Ask,
                BackendRequest::Ask { question, top_k },
            ),
            Effect::Upload { request_id, file } => {
                (request_id, RequestKind::Ops, BackendRequest::Upload { file })
            }
            Effect::Index { request_id } => (request_id, RequestKind::Ops, BackendRequest::Index),
            Effect::Wipe { request_id } => (request_id, RequestKind::Ops, BackendRequest::Wipe),
            Effect::Export {
                request_id,
                filename,
            } => (
                request_id,
                RequestKind::Ops,
                BackendRequest::Export { filename },
            ),
            Effect::Import { request_id, file } => {
                (request_id, RequestKind::Ops, BackendRequest::Import { file })
            }
            Effect::CheckHealth => (HEALTH_REQUEST_ID, RequestKind::Health, BackendRequest::Health),
            Effect::ConfirmWipe { .. } | Effect::FocusQuestion => return,
        };

        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(request_id, kind);
        }
        engine_debug!("Dispatch request_id={} {}", request_id, request.name());
        self.engine.submit(request_id, request);
    }

    fn spawn_event_loop(&self, event_tx: mpsc::Sender<AppEvent>) {
        let engine = self.engine.clone();
        let pending = self.pending.clone();
        thread::spawn(move || {
            while let Some(EngineEvent::Completed { request_id, result }) = engine.recv() {
                let kind = pending
                    .lock()
                    .ok()
                    .and_then(|mut pending| pending.remove(&request_id));
                let Some(kind) = kind else {
                    engine_warn!("Completion for unknown request {}", request_id);
                    continue;
                };
                let msg = to_msg(kind, request_id, result);
                if event_tx.send(AppEvent::Core(msg)).is_err() {
                    break;
                }
            }
        });
    }
}

fn to_msg(
    kind: RequestKind,
    request_id: RequestId,
    result: Result<BackendReply, wikichat_engine::RequestError>,
) -> Msg {
    match kind {
        RequestKind::Health => Msg::HealthChecked {
            reachable: result.is_ok(),
        },
        RequestKind::Ask => Msg::AnswerReceived {
            request_id,
            result: match result {
                Ok(BackendReply::Answer(answer)) => Ok(Answer {
                    answer: answer.answer,
                    sources: answer.sources,
                }),
                Ok(other) => {
                    engine_warn!("Unexpected reply to ask {}: {:?}", request_id, other);
                    Err(Failure::Network)
                }
                Err(err) => Err(map_failure(err.kind, err.message)),
            },
        },
        RequestKind::Ops => Msg::OpsCompleted {
            request_id,
            result: match result {
                Ok(reply) => map_ops_reply(request_id, reply),
                Err(err) => Err(map_failure(err.kind, err.message)),
            },
        },
    }
}

fn map_ops_reply(request_id: RequestId, reply: BackendReply) -> Result<OpsReply, Failure> {
    match reply {
        BackendReply::Uploaded { .. } => Ok(OpsReply::Uploaded),
        BackendReply::Indexed(stats) => Ok(OpsReply::Indexed {
            pages: stats.pages,
            chunks: stats.chunks,
        }),
        BackendReply::Wiped { msg } | BackendReply::Imported { msg } => Ok(OpsReply::Message(msg)),
        BackendReply::Exported { path } => Ok(OpsReply::Exported { path }),
        other @ (BackendReply::Answer(_) | BackendReply::Healthy) => {
            engine_warn!("Unexpected reply to ops {}: {:?}", request_id, other);
            Err(Failure::Network)
        }
    }
}

fn map_failure(kind: FailureKind, message: String) -> Failure {
    match kind {
        FailureKind::Application { error } => Failure::Application(error),
        FailureKind::HttpStatus(code) => Failure::HttpStatus(code),
        FailureKind::Io => Failure::Local(message),
        FailureKind::InvalidUrl
        | FailureKind::Network
        | FailureKind::Timeout
        | FailureKind::InvalidResponse
        | FailureKind::Aborted => Failure::Network,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wikichat_engine::{IndexStats, RequestError};

    fn error(kind: FailureKind, message: &str) -> RequestError {
        RequestError {
            kind,
            message: message.to_string(),
        }
    }

    #[test]
    fn transport_failures_map_to_network() {
        for kind in [
            FailureKind::Network,
            FailureKind::Timeout,
            FailureKind::InvalidResponse,
            FailureKind::Aborted,
        ] {
            assert_eq!(
                to_msg(RequestKind::Ask, 3, Err(error(kind, "x"))),
                Msg::AnswerReceived {
                    request_id: 3,
                    result: Err(Failure::Network),
                }
            );
        }
    }

    #[test]
    fn ops_replies_map_to_core() {
        assert_eq!(
            to_msg(
                RequestKind::Ops,
                4,
                Ok(BackendReply::Indexed(IndexStats {
                    pages: 12,
                    chunks: 340
                }))
            ),
            Msg::OpsCompleted {
                request_id: 4,
                result: Ok(OpsReply::Indexed {
                    pages: 12,
                    chunks: 340
                }),
            }
        );
        assert_eq!(
            to_msg(
                RequestKind::Ops,
                5,
                Ok(BackendReply::Exported {
                    path: PathBuf::from("chroma_index.zip")
                })
            ),
            Msg::OpsCompleted {
                request_id: 5,
                result: Ok(OpsReply::Exported {
                    path: PathBuf::from("chroma_index.zip")
                }),
            }
        );
        assert_eq!(
            to_msg(
                RequestKind::Ops,
                6,
                Err(error(FailureKind::HttpStatus(502), "Bad Gateway"))
            ),
            Msg::OpsCompleted {
                request_id: 6,
                result: Err(Failure::HttpStatus(502)),
            }
        );
    }

    #[test]
    fn mismatched_ops_reply_is_a_failure() {
        assert_eq!(
            to_msg(RequestKind::Ops, 7, Ok(BackendReply::Healthy)),
            Msg::OpsCompleted {
                request_id: 7,
                result: Err(Failure::Network),
            }
        );
    }

    #[test]
    fn missing_local_file_is_reported_with_detail() {
        assert_eq!(
            map_failure(FailureKind::Io, "\"a.pdf\": not found".to_string()),
            Failure::Local("\"a.pdf\": not found".to_string())
        );
    }

    #[test]
    fn health_result() {
        assert_eq!(
            to_msg(RequestKind::Health, 0, Ok(BackendReply::Healthy)),
            Msg::HealthChecked { reachable: true }
        );
        assert_eq!(
            to_msg(
                RequestKind::Health,
                0,
                Err(error(FailureKind::Network, "refused"))
            ),
            Msg::HealthChecked { reachable: false }
        );
    }
}
