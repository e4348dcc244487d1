use std::io::{self, Write};

use wikichat_core::{AppViewModel, Message, Role, ServerHealth};

use super::constants::*;

const CLEAR_LINE: &str = "\r\x1b[2K";

/// Writes view-model changes to a line-oriented terminal.
///
/// The transcript is append-only, so only entries past `printed` are written.
/// The typing indicator lives on the last line and is redrawn in place.
pub struct TerminalRenderer<W: Write> {
    out: W,
    server_url: String,
    printed: usize,
    status_revision: u64,
    ops_in_flight: usize,
    last_server: ServerHealth,
    confirm_shown: bool,
    typing_visible: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, server_url: impl Into<String>) -> Self {
        Self {
            out,
            server_url: server_url.into(),
            printed: 0,
            status_revision: 0,
            ops_in_flight: 0,
            last_server: ServerHealth::Unknown,
            confirm_shown: false,
            typing_visible: false,
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        if self.typing_visible {
            write!(self.out, "{CLEAR_LINE}")?;
            self.typing_visible = false;
        }

        for message in view.transcript.iter().skip(self.printed) {
            write_message(&mut self.out, message)?;
        }
        self.printed = view.transcript.len();

        if view.server != self.last_server {
            self.last_server = view.server;
            match view.server {
                ServerHealth::Reachable => {
                    writeln!(self.out, "[servidor] conectado a {}", self.server_url)?
                }
                ServerHealth::Unreachable => writeln!(
                    self.out,
                    "[servidor] sin respuesta en {}",
                    self.server_url
                )?,
                ServerHealth::Unknown => {}
            }
        }

        if view.status_revision != self.status_revision {
            if let Some(status) = &view.status {
                writeln!(self.out, "[{STATUS_LABEL}] {status}")?;
            }
            self.status_revision = view.status_revision;
        }
        self.ops_in_flight = view.ops_in_flight;

        match (&view.confirm_prompt, self.confirm_shown) {
            (Some(prompt), false) => {
                write!(self.out, "{prompt}{CONFIRM_SUFFIX}")?;
                self.confirm_shown = true;
            }
            (None, true) => self.confirm_shown = false,
            _ => {}
        }

        if let Some(typing) = &view.typing {
            write!(self.out, "{ASSISTANT_LABEL}> {typing}")?;
            self.typing_visible = true;
        }

        self.out.flush()
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        if self.typing_visible {
            return Ok(());
        }
        if self.ops_in_flight > 0 {
            write!(self.out, "[{STATUS_LABEL}: {}] ", self.ops_in_flight)?;
        }
        write!(self.out, "{PROMPT}")?;
        self.out.flush()
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        if self.typing_visible {
            write!(self.out, "{CLEAR_LINE}")?;
            self.typing_visible = false;
        }
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

fn write_message(out: &mut impl Write, message: &Message) -> io::Result<()> {
    let label = match message.role {
        Role::User => USER_LABEL,
        Role::Assistant => ASSISTANT_LABEL,
    };
    writeln!(out, "{label}> {}", message.text)?;
    for source in &message.sources {
        writeln!(out, "    • {source}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikichat_core::{update, Answer, AppState, Failure, Msg, OpsReply};

    fn output(renderer: TerminalRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renders_only_new_messages_and_sources() {
        let mut renderer = TerminalRenderer::new(Vec::new(), "http://localhost:5000");
        let (state, _) = update(
            AppState::new(),
            Msg::QuestionChanged("What is the refund policy?".to_string()),
        );
        let (state, _) = update(state, Msg::AskSubmitted);
        renderer.render(&state.view()).unwrap();

        let (state, _) = update(
            state,
            Msg::AnswerReceived {
                request_id: 1,
                result: Ok(Answer {
                    answer: "Refunds within 30 days.".to_string(),
                    sources: vec!["policy.pdf p.2".to_string()],
                }),
            },
        );
        renderer.render(&state.view()).unwrap();
        renderer.render(&state.view()).unwrap();

        let text = output(renderer);
        assert_eq!(text.matches("tú> What is the refund policy?").count(), 1);
        assert_eq!(text.matches("wiki> Refunds within 30 days.").count(), 1);
        assert!(text.contains("    • policy.pdf p.2\n"));
        // Indicator drawn after the question, then cleared before the answer.
        let typing_at = text.find("Procesando").unwrap();
        let answer_at = text.find("Refunds").unwrap();
        assert!(typing_at < answer_at);
        assert!(text[typing_at..answer_at].contains(CLEAR_LINE));
    }

    #[test]
    fn status_printed_once_per_change() {
        let mut renderer = TerminalRenderer::new(Vec::new(), "http://localhost:5000");
        let (state, _) = update(AppState::new(), Msg::IndexClicked);
        renderer.render(&state.view()).unwrap();
        renderer.render(&state.view()).unwrap();

        let text = output(renderer);
        assert_eq!(text, "[ops] Indexando...\n");
    }

    #[test]
    fn repeated_wipe_result_is_printed_each_time() {
        let mut renderer = TerminalRenderer::new(Vec::new(), "http://localhost:5000");
        let mut state = AppState::new();
        for request_id in [1, 2] {
            let (next, _) = update(state, Msg::WipeClicked);
            let (next, _) = update(next, Msg::WipeConfirmation { confirmed: true });
            renderer.render(&next.view()).unwrap();
            let (next, _) = update(
                next,
                Msg::OpsCompleted {
                    request_id,
                    result: Ok(OpsReply::Message("Colección eliminada.".to_string())),
                },
            );
            renderer.render(&next.view()).unwrap();
            state = next;
        }

        let text = output(renderer);
        assert_eq!(text.matches("[ops] Colección eliminada.\n").count(), 2);
    }

    #[test]
    fn prompt_shows_pending_ops() {
        let mut renderer = TerminalRenderer::new(Vec::new(), "http://localhost:5000");
        let (state, _) = update(AppState::new(), Msg::ExportClicked);
        renderer.render(&state.view()).unwrap();
        renderer.prompt().unwrap();
        let (state, _) = update(
            state,
            Msg::OpsCompleted {
                request_id: 1,
                result: Err(Failure::HttpStatus(500)),
            },
        );
        renderer.render(&state.view()).unwrap();
        renderer.prompt().unwrap();

        let text = output(renderer);
        assert_eq!(
            text,
            "[ops] Exportando índice...\n[ops: 1] > [ops] Error al exportar\n> "
        );
    }

    #[test]
    fn confirmation_prompt_and_server_state() {
        let mut renderer = TerminalRenderer::new(Vec::new(), "http://wiki.local");
        let (state, _) = update(AppState::new(), Msg::HealthChecked { reachable: true });
        let (state, _) = update(state, Msg::WipeClicked);
        renderer.render(&state.view()).unwrap();
        renderer.render(&state.view()).unwrap();

        let text = output(renderer);
        assert_eq!(
            text,
            "[servidor] conectado a http://wiki.local\n¿Borrar la colección completa? [s/N] "
        );
    }
}
