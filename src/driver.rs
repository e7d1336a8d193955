//! Terminal driver — walks a tour from line-based commands.
//!
//! Stands in for the overlay UI: each command maps to a tour operation and
//! the resulting overlay is rendered as text.

use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::tour::{LayoutMap, OverlayAction, TourManager};

/// Row height of the simulated sidebar, in pixels.
const ROW_HEIGHT: f64 = 48.0;
/// Height of the simulated viewport, in pixels.
const VIEWPORT_HEIGHT: f64 = 240.0;

pub const HELP: &str = "commands: start | next | prev | skip N | play | replay | stop | end | \
                        role NAME | status | help | quit";

/// A parsed driver command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    Start,
    Action(OverlayAction),
    /// 1-based step number as typed.
    Skip(usize),
    Role(String),
    Status,
    Help,
    Quit,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<DriverCommand, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next();

    let command = match verb.as_str() {
        "start" => DriverCommand::Start,
        "next" | "n" => DriverCommand::Action(OverlayAction::Next),
        "prev" | "back" | "p" => DriverCommand::Action(OverlayAction::Back),
        "play" => DriverCommand::Action(OverlayAction::PlayOverview),
        "replay" => DriverCommand::Action(OverlayAction::Replay),
        "stop" | "pause" => DriverCommand::Action(OverlayAction::Pause),
        "end" | "skip-tour" | "close" => DriverCommand::Action(OverlayAction::Close),
        "skip" => {
            let raw = arg.ok_or("skip needs a step number")?;
            let number: usize = raw
                .parse()
                .map_err(|_| format!("not a step number: {raw}"))?;
            DriverCommand::Skip(number)
        }
        "role" => DriverCommand::Role(arg.ok_or("role needs a name")?.to_string()),
        "status" => DriverCommand::Status,
        "help" | "?" => DriverCommand::Help,
        "quit" | "exit" | "q" => DriverCommand::Quit,
        "" => return Err("empty command".to_string()),
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(command)
}

/// Result of handling one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Print(String),
    Quit,
}

/// Drives a [`TourManager`] against a simulated sidebar layout.
pub struct Driver {
    manager: Arc<TourManager>,
    layout: LayoutMap,
}

impl Driver {
    pub async fn new(manager: Arc<TourManager>) -> Self {
        let layout = sidebar_for(&manager).await;
        Self { manager, layout }
    }

    pub async fn handle(&mut self, command: DriverCommand) -> Outcome {
        match command {
            DriverCommand::Start => self.manager.start_tour().await,
            DriverCommand::Action(action) => self.manager.dispatch(action).await,
            DriverCommand::Skip(0) => return Outcome::Print("steps are numbered from 1".into()),
            DriverCommand::Skip(number) => self.manager.skip_to_step(number - 1).await,
            DriverCommand::Role(name) => {
                self.manager.set_role(&name).await;
                self.layout = sidebar_for(&self.manager).await;
            }
            DriverCommand::Status => {
                let snapshot = self.manager.snapshot();
                let text = serde_json::to_string_pretty(&snapshot)
                    .unwrap_or_else(|e| format!("failed to encode status: {e}"));
                return Outcome::Print(text);
            }
            DriverCommand::Help => return Outcome::Print(HELP.to_string()),
            DriverCommand::Quit => return Outcome::Quit,
        }
        Outcome::Print(self.render().await)
    }

    /// Handle a raw input line.
    pub async fn handle_line(&mut self, line: &str) -> Outcome {
        match parse_command(line) {
            Ok(command) => self.handle(command).await,
            Err(e) => Outcome::Print(format!("{e}\n{HELP}")),
        }
    }

    async fn render(&self) -> String {
        match self.manager.overlay(&self.layout).await {
            Some(view) => view.render_text(),
            None if self.manager.has_completed_tour().await => {
                "(tour closed, completion recorded)".to_string()
            }
            None => "(tour closed)".to_string(),
        }
    }
}

async fn sidebar_for(manager: &TourManager) -> LayoutMap {
    match manager.tour_config().await {
        Some(config) => LayoutMap::sidebar(config.steps, ROW_HEIGHT, VIEWPORT_HEIGHT),
        None => LayoutMap::new(VIEWPORT_HEIGHT),
    }
}

/// Non-empty trimmed lines from `reader`, ending at EOF or a read error.
pub fn input_lines<R>(reader: R) -> impl Stream<Item = String>
where
    R: AsyncBufRead + Unpin,
{
    stream::unfold(reader.lines(), |mut lines| async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        return Some((line, lines));
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!("Error reading input: {}", e);
                    return None;
                }
            }
        }
    })
}
