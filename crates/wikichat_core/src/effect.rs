use std::path::PathBuf;

use crate::RequestId;

/// Side effects requested by [`crate::update`]; executed by the platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Ask {
        request_id: RequestId,
        question: String,
        top_k: u32,
    },
    Upload {
        request_id: RequestId,
        file: Option<PathBuf>,
    },
    Index { request_id: RequestId },
    /// Ask the user to confirm a wipe; answered with `Msg::WipeConfirmation`.
    ConfirmWipe { prompt: String },
    Wipe { request_id: RequestId },
    Export {
        request_id: RequestId,
        filename: String,
    },
    Import {
        request_id: RequestId,
        file: Option<PathBuf>,
    },
    CheckHealth,
    FocusQuestion,
}
