//! JSON shapes exchanged with the backend.

use serde::{Deserialize, Serialize};

use crate::{FailureKind, RequestError};

#[derive(Debug, Serialize)]
pub(crate) struct AskBody<'a> {
    pub q: &'a str,
    pub k: u32,
}

/// Every JSON reply carries `ok`; failures add `error`, successes add the
/// endpoint-specific payload.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiReply<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    payload: T,
}

impl<T> ApiReply<T> {
    pub fn into_result(self) -> Result<T, RequestError> {
        if self.ok {
            Ok(self.payload)
        } else {
            let message = self.error.clone().unwrap_or_default();
            Err(RequestError::new(
                FailureKind::Application { error: self.error },
                message,
            ))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AskPayload {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadPayload {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IndexPayload {
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub chunks: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MsgPayload {
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NoPayload {}
