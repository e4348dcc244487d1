use std::io::{self, BufRead, Stdout};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use engine_logging::{engine_info, engine_warn};
use wikichat_core::{update, AppState, Effect, Msg};
use wikichat_engine::EngineHandle;

use super::effects::EffectRunner;
use super::input::{self, Input};
use super::ui::constants::{BUSY_NOTICE, HELP, TYPING_TICK_MS};
use super::ui::render::TerminalRenderer;
use crate::config::Cli;

/// Everything the main loop reacts to.
pub enum AppEvent {
    Line(String),
    InputClosed,
    Core(Msg),
}

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let engine = EngineHandle::new(cli.backend_settings())
        .map_err(|err| anyhow!("invalid server configuration {}: {err}", cli.server))?;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(engine, event_tx.clone());
    spawn_input_reader(event_tx.clone());
    spawn_ticker(event_tx);

    let mut session = Session {
        state: AppState::with_top_k(cli.top_k),
        runner,
        renderer: TerminalRenderer::new(io::stdout(), cli.server.clone()),
    };
    engine_info!("wikichat started against {}", cli.server);

    session.renderer.notice(HELP).context("write to terminal")?;
    session.dispatch(Msg::Started)?;
    session.renderer.prompt()?;

    while let Ok(event) = event_rx.recv() {
        match event {
            AppEvent::Core(msg) => session.dispatch(msg)?,
            AppEvent::Line(line) => match input::parse_line(&line, &session.state.view()) {
                Input::Msgs(msgs) => {
                    for msg in msgs {
                        session.dispatch(msg)?;
                    }
                    session.renderer.prompt()?;
                }
                Input::Busy => session.renderer.notice(BUSY_NOTICE)?,
                Input::Help => {
                    session.renderer.notice(HELP)?;
                    session.renderer.prompt()?;
                }
                Input::Unknown(command) => {
                    session
                        .renderer
                        .notice(&format!("Comando desconocido: {command}"))?;
                    session.renderer.prompt()?;
                }
                Input::Quit => break,
            },
            AppEvent::InputClosed => break,
        }
    }

    if session.state.is_asking() {
        engine_warn!("Exiting with a question still in flight");
    }
    engine_info!("wikichat stopped");
    Ok(())
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer<Stdout>,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let (state, effects) = update(std::mem::take(&mut self.state), msg);
        self.state = state;

        let mut focus_question = false;
        for effect in effects {
            match effect {
                Effect::FocusQuestion => focus_question = true,
                // The prompt itself is drawn from the view model.
                Effect::ConfirmWipe { .. } => {}
                other => self.runner.run(other),
            }
        }

        if self.state.consume_dirty() {
            self.renderer.render(&self.state.view())?;
        }
        if focus_question {
            self.renderer.prompt()?;
        }
        Ok(())
    }
}

fn spawn_input_reader(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        read_lines(stdin.lock(), &event_tx);
        let _ = event_tx.send(AppEvent::InputClosed);
    });
}

/// Forwards input lines until end of input. Bytes that are not UTF-8 (for
/// example from a Latin-1 terminal) are replaced rather than ending the session.
fn read_lines(mut reader: impl BufRead, event_tx: &mpsc::Sender<AppEvent>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                if event_tx.send(AppEvent::Line(line)).is_err() {
                    return;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                engine_warn!("Reading terminal input failed: {}", err);
                return;
            }
        }
    }
}

/// Drives the typing indicator animation.
fn spawn_ticker(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let interval = Duration::from_millis(TYPING_TICK_MS);
        loop {
            thread::sleep(interval);
            if event_tx.send(AppEvent::Core(Msg::Tick)).is_err() {
                break;
            }
        }
    });
}
