use std::path::PathBuf;

use crate::RequestId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Application started; triggers the server health probe.
    Started,
    /// User edited the question field.
    QuestionChanged(String),
    /// User edited the top-k field (raw text, parsed on submit).
    TopKChanged(String),
    /// User submitted the ask form.
    AskSubmitted,
    /// Backend settled an ask request.
    AnswerReceived {
        request_id: RequestId,
        result: Result<Answer, Failure>,
    },
    /// User submitted the upload form. `None` when no file was selected.
    UploadSubmitted { file: Option<PathBuf> },
    IndexClicked,
    WipeClicked,
    /// User answered the wipe confirmation prompt.
    WipeConfirmation { confirmed: bool },
    ExportClicked,
    /// User submitted the import form. `None` when no archive was selected.
    ImportSubmitted { file: Option<PathBuf> },
    /// Backend settled an upload/index/wipe/export/import request.
    OpsCompleted {
        request_id: RequestId,
        result: Result<OpsReply, Failure>,
    },
    /// Result of the server health probe.
    HealthChecked { reachable: bool },
    /// Animation tick for the typing indicator.
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpsReply {
    Uploaded,
    Indexed { pages: u64, chunks: u64 },
    /// Wipe and import confirmations carry the backend message verbatim.
    Message(String),
    Exported { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The request did not complete or the reply could not be read.
    Network,
    /// Backend replied `ok: false`, with its error text when supplied.
    Application(Option<String>),
    /// Non-success HTTP status on an endpoint without a JSON contract.
    HttpStatus(u16),
    /// A local file could not be read (upload/import) or written (export).
    Local(String),
}
