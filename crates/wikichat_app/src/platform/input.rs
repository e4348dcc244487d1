//! Maps terminal input lines to core messages.

use std::path::PathBuf;

use wikichat_core::{AppViewModel, Msg};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Msgs(Vec<Msg>),
    /// Ask-form input (a question or `/k`) while the previous question is
    /// still in flight.
    Busy,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str, view: &AppViewModel) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);

    if view.confirm_prompt.is_some() {
        return Input::Msgs(vec![Msg::WipeConfirmation {
            confirmed: is_yes(line),
        }]);
    }

    let Some(command) = line.trim_start().strip_prefix('/') else {
        if !view.ask_form.enabled && !line.trim().is_empty() {
            return Input::Busy;
        }
        return Input::Msgs(vec![
            Msg::QuestionChanged(line.to_string()),
            Msg::AskSubmitted,
        ]);
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "k" if !view.ask_form.enabled => Input::Busy,
        "k" => Input::Msgs(vec![Msg::TopKChanged(arg.to_string())]),
        "upload" | "subir" => Input::Msgs(vec![Msg::UploadSubmitted {
            file: optional_path(arg),
        }]),
        "index" | "indexar" => Input::Msgs(vec![Msg::IndexClicked]),
        "wipe" | "borrar" => Input::Msgs(vec![Msg::WipeClicked]),
        "export" | "exportar" => Input::Msgs(vec![Msg::ExportClicked]),
        "import" | "importar" => Input::Msgs(vec![Msg::ImportSubmitted {
            file: optional_path(arg),
        }]),
        "help" | "ayuda" | "?" => Input::Help,
        "quit" | "exit" | "salir" => Input::Quit,
        _ => Input::Unknown(line.trim().to_string()),
    }
}

fn optional_path(arg: &str) -> Option<PathBuf> {
    let arg = arg.trim_matches(|c| c == '"' || c == '\'');
    (!arg.is_empty()).then(|| PathBuf::from(arg))
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}
