use crate::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerHealth {
    #[default]
    Unknown,
    Reachable,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub transcript: Vec<Message>,
    /// Typing indicator text; `Some` only while an ask is in flight.
    pub typing: Option<String>,
    pub ask_form: AskFormView,
    pub status: Option<String>,
    /// Bumped on every status write, so a repeated text still counts as new.
    pub status_revision: u64,
    pub ops_in_flight: usize,
    pub confirm_prompt: Option<String>,
    pub server: ServerHealth,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AskFormView {
    pub question: String,
    pub top_k: String,
    pub enabled: bool,
}
