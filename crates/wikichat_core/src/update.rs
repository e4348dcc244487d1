use crate::labels;
use crate::{AppState, Effect, Failure, Message, Msg, OpsAction, OpsReply, ServerHealth};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![Effect::CheckHealth],
        Msg::QuestionChanged(text) => {
            state.set_question(text);
            Vec::new()
        }
        Msg::TopKChanged(text) => {
            state.set_top_k(text);
            Vec::new()
        }
        Msg::AskSubmitted => match state.begin_ask() {
            Some((request_id, question, top_k)) => vec![Effect::Ask {
                request_id,
                question,
                top_k,
            }],
            None => Vec::new(),
        },
        Msg::AnswerReceived { request_id, result } => {
            let reply = match result {
                Ok(answer) => Message::assistant(answer.answer, answer.sources),
                Err(failure) => Message::assistant(labels::describe_failure(&failure), Vec::new()),
            };
            if state.finish_ask(request_id, reply) {
                vec![Effect::FocusQuestion]
            } else {
                Vec::new()
            }
        }
        Msg::UploadSubmitted { file } => {
            let request_id = state.begin_ops(OpsAction::Upload);
            vec![Effect::Upload { request_id, file }]
        }
        Msg::IndexClicked => {
            let request_id = state.begin_ops(OpsAction::Index);
            vec![Effect::Index { request_id }]
        }
        Msg::WipeClicked => {
            if state.request_wipe_confirmation() {
                vec![Effect::ConfirmWipe {
                    prompt: labels::WIPE_PROMPT.to_string(),
                }]
            } else {
                Vec::new()
            }
        }
        Msg::WipeConfirmation { confirmed } => {
            if state.take_wipe_confirmation() && confirmed {
                let request_id = state.begin_ops(OpsAction::Wipe);
                vec![Effect::Wipe { request_id }]
            } else {
                Vec::new()
            }
        }
        Msg::ExportClicked => {
            let request_id = state.begin_ops(OpsAction::Export);
            vec![Effect::Export {
                request_id,
                filename: labels::EXPORT_FILENAME.to_string(),
            }]
        }
        Msg::ImportSubmitted { file } => {
            let request_id = state.begin_ops(OpsAction::Import);
            vec![Effect::Import { request_id, file }]
        }
        Msg::OpsCompleted { request_id, result } => {
            if let Some(action) = state.finish_ops(request_id) {
                state.set_status(ops_status(action, result));
            }
            Vec::new()
        }
        Msg::HealthChecked { reachable } => {
            state.set_server(if reachable {
                ServerHealth::Reachable
            } else {
                ServerHealth::Unreachable
            });
            Vec::new()
        }
        Msg::Tick => {
            state.advance_typing();
            Vec::new()
        }
    };

    (state, effects)
}

fn ops_status(action: OpsAction, result: Result<OpsReply, Failure>) -> String {
    match result {
        Ok(OpsReply::Uploaded) => labels::UPLOADED.to_string(),
        Ok(OpsReply::Indexed { pages, chunks }) => labels::indexed(pages, chunks),
        Ok(OpsReply::Message(msg)) => msg,
        Ok(OpsReply::Exported { .. }) => labels::EXPORTED.to_string(),
        Err(Failure::Local(detail)) if action == OpsAction::Export => {
            labels::save_failed(&detail)
        }
        Err(failure) => labels::describe_failure(&failure),
    }
}
