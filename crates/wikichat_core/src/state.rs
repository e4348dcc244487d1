use std::collections::BTreeMap;

use crate::labels;
use crate::view_model::{AppViewModel, AskFormView, ServerHealth};

pub type RequestId = u64;

pub const DEFAULT_TOP_K: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub sources: Vec<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            sources,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpsAction {
    Upload,
    Index,
    Wipe,
    Export,
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AskPhase {
    #[default]
    Idle,
    InFlight { request_id: RequestId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    transcript: Vec<Message>,
    question: String,
    top_k: String,
    ask: AskPhase,
    typing_frame: Option<u8>,
    status: Option<String>,
    status_revision: u64,
    pending_ops: BTreeMap<RequestId, OpsAction>,
    awaiting_wipe_confirmation: bool,
    server: ServerHealth,
    next_request_id: RequestId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            transcript: Vec::new(),
            question: String::new(),
            top_k: DEFAULT_TOP_K.to_string(),
            ask: AskPhase::Idle,
            typing_frame: None,
            status: None,
            status_revision: 0,
            pending_ops: BTreeMap::new(),
            awaiting_wipe_confirmation: false,
            server: ServerHealth::Unknown,
            next_request_id: 1,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with the top-k field pre-filled, e.g. from the command line.
    pub fn with_top_k(top_k: u32) -> Self {
        Self {
            top_k: top_k.to_string(),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            transcript: self.transcript.clone(),
            typing: self.typing_frame.map(labels::typing),
            ask_form: AskFormView {
                question: self.question.clone(),
                top_k: self.top_k.clone(),
                enabled: self.ask == AskPhase::Idle,
            },
            status: self.status.clone(),
            status_revision: self.status_revision,
            ops_in_flight: self.pending_ops.len(),
            confirm_prompt: self
                .awaiting_wipe_confirmation
                .then(|| labels::WIPE_PROMPT.to_string()),
            server: self.server,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn is_asking(&self) -> bool {
        self.ask != AskPhase::Idle
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Ignored while an ask is in flight: the form is disabled.
    pub(crate) fn set_question(&mut self, text: String) {
        if !self.is_asking() && self.question != text {
            self.question = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_top_k(&mut self, text: String) {
        if !self.is_asking() && self.top_k != text {
            self.top_k = text;
            self.mark_dirty();
        }
    }

    /// Starts an ask cycle: optimistic user message, typing indicator,
    /// disabled form. Returns `None` when nothing may be sent.
    pub(crate) fn begin_ask(&mut self) -> Option<(RequestId, String, u32)> {
        if self.is_asking() {
            return None;
        }
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return None;
        }
        let top_k = parse_top_k(&self.top_k);
        let request_id = self.allocate_request_id();

        self.transcript.push(Message::user(question.clone()));
        self.question.clear();
        self.typing_frame = Some(0);
        self.ask = AskPhase::InFlight { request_id };
        self.mark_dirty();
        Some((request_id, question, top_k))
    }

    /// Settles the in-flight ask. Returns false for a reply that does not
    /// belong to the current request.
    pub(crate) fn finish_ask(&mut self, request_id: RequestId, reply: Message) -> bool {
        if self.ask != (AskPhase::InFlight { request_id }) {
            return false;
        }
        self.typing_frame = None;
        self.transcript.push(reply);
        self.ask = AskPhase::Idle;
        self.mark_dirty();
        true
    }

    pub(crate) fn advance_typing(&mut self) {
        if let Some(frame) = self.typing_frame.as_mut() {
            *frame = (*frame + 1) % 4;
            self.dirty = true;
        }
    }

    pub(crate) fn begin_ops(&mut self, action: OpsAction) -> RequestId {
        let request_id = self.allocate_request_id();
        self.pending_ops.insert(request_id, action);
        if let Some(label) = labels::in_flight(action) {
            self.set_status(label.to_string());
        }
        self.mark_dirty();
        request_id
    }

    pub(crate) fn finish_ops(&mut self, request_id: RequestId) -> Option<OpsAction> {
        let action = self.pending_ops.remove(&request_id)?;
        self.mark_dirty();
        Some(action)
    }

    pub(crate) fn set_status(&mut self, text: String) {
        self.status = Some(text);
        self.status_revision += 1;
        self.mark_dirty();
    }

    pub(crate) fn request_wipe_confirmation(&mut self) -> bool {
        if self.awaiting_wipe_confirmation {
            return false;
        }
        self.awaiting_wipe_confirmation = true;
        self.mark_dirty();
        true
    }

    pub(crate) fn take_wipe_confirmation(&mut self) -> bool {
        if !self.awaiting_wipe_confirmation {
            return false;
        }
        self.awaiting_wipe_confirmation = false;
        self.mark_dirty();
        true
    }

    pub(crate) fn set_server(&mut self, server: ServerHealth) {
        if self.server != server {
            self.server = server;
            self.mark_dirty();
        }
    }
}

/// Parses the top-k field the way a browser `parseInt` would read it: leading
/// whitespace, then leading digits. Anything without a positive number yields
/// [`DEFAULT_TOP_K`].
pub fn parse_top_k(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let digits = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    match digits.parse::<u32>() {
        Ok(k) if k > 0 => k,
        _ => DEFAULT_TOP_K,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_reads_leading_digits() {
        assert_eq!(parse_top_k("8"), 8);
        assert_eq!(parse_top_k("  12abc"), 12);
        assert_eq!(parse_top_k("+3"), 3);
    }

    #[test]
    fn top_k_falls_back_to_default() {
        assert_eq!(parse_top_k(""), DEFAULT_TOP_K);
        assert_eq!(parse_top_k("abc"), DEFAULT_TOP_K);
        assert_eq!(parse_top_k("0"), DEFAULT_TOP_K);
        assert_eq!(parse_top_k("-4"), DEFAULT_TOP_K);
        assert_eq!(parse_top_k("99999999999"), DEFAULT_TOP_K);
    }
}
