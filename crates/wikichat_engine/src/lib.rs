//! Wikichat engine: HTTP backend client and request execution.
mod backend;
mod engine;
mod persist;
mod types;
mod wire;

pub use backend::{Backend, BackendSettings, ReqwestBackend};
pub use engine::EngineHandle;
pub use persist::{prepare_download_dir, ArchiveWriter, PersistError};
pub use types::{
    Answer, BackendReply, BackendRequest, EngineEvent, FailureKind, IndexStats, RequestError,
    RequestId,
};
