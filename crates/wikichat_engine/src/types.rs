use std::fmt;
use std::path::PathBuf;

pub type RequestId = u64;

/// One call against the backend, as queued on the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    Ask { question: String, top_k: u32 },
    Upload { file: Option<PathBuf> },
    Index,
    Wipe,
    Export { filename: String },
    Import { file: Option<PathBuf> },
    Health,
}

impl BackendRequest {
    pub fn name(&self) -> &'static str {
        match self {
            BackendRequest::Ask { .. } => "ask",
            BackendRequest::Upload { .. } => "upload",
            BackendRequest::Index => "index",
            BackendRequest::Wipe => "wipe",
            BackendRequest::Export { .. } => "export",
            BackendRequest::Import { .. } => "import",
            BackendRequest::Health => "health",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub pages: u64,
    pub chunks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendReply {
    Answer(Answer),
    Uploaded { filename: Option<String> },
    Indexed(IndexStats),
    Wiped { msg: String },
    Exported { path: PathBuf },
    Imported { msg: String },
    Healthy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Completed {
        request_id: RequestId,
        result: Result<BackendReply, RequestError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    /// Body of a JSON endpoint could not be decoded.
    InvalidResponse,
    /// Backend answered `ok: false`.
    Application { error: Option<String> },
    HttpStatus(u16),
    /// Local file could not be read (upload/import) or written (export).
    Io,
    /// The request task ended without producing a result.
    Aborted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::InvalidResponse => write!(f, "invalid response body"),
            FailureKind::Application { error: Some(error) } => {
                write!(f, "backend error: {error}")
            }
            FailureKind::Application { error: None } => write!(f, "backend error"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Aborted => write!(f, "request aborted"),
        }
    }
}
