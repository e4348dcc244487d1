//! Wikichat core: pure chat/ops state machine and view-model helpers.
mod effect;
mod labels;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use labels::{describe_failure, EXPORT_FILENAME, WIPE_PROMPT};
pub use msg::{Answer, Failure, Msg, OpsReply};
pub use state::{parse_top_k, AppState, Message, OpsAction, RequestId, Role, DEFAULT_TOP_K};
pub use update::update;
pub use view_model::{AppViewModel, AskFormView, ServerHealth};
