//! Terminal host for the chat widget.
//!
//! Stands in for the browser surface during development: prints messages as
//! they are appended and reads user input from stdin.
//! - plain text is sent as free text
//! - `/1` .. `/4` click a quick reply
//! - `/quit` exits

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::assistant::{Assistant, AssistantError, ChatEvent};
use crate::chat::{ChatWidget, MessageView};
use crate::config::AssistantConfig;

/// Parsed command-line options.
#[derive(Debug, Default, PartialEq)]
pub struct HostOptions {
    pub config_path: Option<PathBuf>,
}

impl HostOptions {
    /// Accepts `--config <path>`; anything else is an error.
    pub fn parse<I>(args: I) -> Result<Self, AssistantError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or_else(|| {
                        AssistantError::Config("--config requires a path".into())
                    })?;
                    options.config_path = Some(PathBuf::from(path));
                }
                other => {
                    return Err(AssistantError::Config(format!("unknown argument: {other}")));
                }
            }
        }
        Ok(options)
    }

    pub fn load_config(&self) -> Result<AssistantConfig, AssistantError> {
        match &self.config_path {
            Some(path) => AssistantConfig::load(path),
            None => Ok(AssistantConfig::default()),
        }
    }
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    QuickReply(u32),
    Text(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed == "/quit" {
        return Command::Quit;
    }
    if let Some(id) = trimmed.strip_prefix('/').and_then(|n| n.parse().ok()) {
        return Command::QuickReply(id);
    }
    Command::Text(line.to_string())
}

fn render(view: &MessageView) -> String {
    let who = if view.sender == "user" { "you" } else { "assistant" };
    format!("[{}] {}: {}", view.time, who, view.text)
}

/// Run the interactive session until `/quit` or end of input.
pub async fn run(options: HostOptions) -> Result<(), AssistantError> {
    let config = options.load_config()?;
    let assistant = Assistant::new(config)?;
    let mut events = assistant.subscribe();
    let mut widget = ChatWidget::new(assistant);
    widget.open();

    for view in widget.messages() {
        println!("{}", render(&view));
    }
    let menu: Vec<String> = widget
        .quick_replies()
        .iter()
        .map(|r| format!("/{} {} {}", r.id, r.icon, r.text))
        .collect();
    println!("Quick replies: {}", menu.join("  "));

    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ChatEvent::MessageAppended { message }) => {
                    println!("{}", render(&MessageView::from(message)));
                }
                Ok(ChatEvent::ComposingChanged { composing: true, .. }) => {
                    println!("assistant is typing...");
                }
                Ok(ChatEvent::ComposingChanged { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Terminal fell behind on chat events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Quit => break,
            Command::QuickReply(id) => {
                if let Err(e) = widget.select_quick_reply(id) {
                    println!("{e}");
                }
            }
            Command::Text(text) => {
                widget.set_input(&text);
                widget.send();
            }
        }
    }

    widget.close();
    printer.abort();
    tracing::info!("Terminal session ended");
    Ok(())
}
