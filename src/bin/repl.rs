//! Terminal driver for the conversation core.
//!
//! Reads lines from stdin, streams the assistant reply to stdout, and
//! exposes a couple of maintenance commands. Useful for exercising a
//! deployment without the mobile client.
//!
//! Usage: `palaver-repl [settings.json]`

use std::io::Write as _;
use std::sync::Arc;

use anyhow::Context;
use palaver::attendance::AttendanceClient;
use palaver::attendance::client::AttendanceApi;
use palaver::chat::{ChatMessage, Conversation, ConversationObserver};
use palaver::config::AssistantConfig;
use palaver::store::MessageStore;
use tracing_subscriber::EnvFilter;

/// Prints streaming updates as they arrive.
struct TerminalObserver;

impl ConversationObserver for TerminalObserver {
    fn messages_changed(&self, messages: &[ChatMessage]) {
        // Redraw just the in-flight tail; full-history rendering is the
        // embedding UI's job.
        if let Some(last) = messages.last()
            && last.is_streaming
        {
            print!("\r\x1b[2K{}", last.text);
            let _ = std::io::stdout().flush();
        }
    }

    fn busy_changed(&self, busy: bool) {
        if !busy {
            println!();
        }
    }

    fn alert(&self, text: &str) {
        eprintln!("! {text}");
    }

    fn speak(&self, _text: &str) {
        // No speech engine attached in the terminal driver.
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => AssistantConfig::load(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => AssistantConfig::default(),
    };

    let store = MessageStore::open_default().context("opening conversation store")?;
    let attendance = Arc::new(AttendanceClient::new(&config.attendance)?);
    let mut conversation = Conversation::with_attendance(
        config,
        store,
        Arc::new(TerminalObserver),
        attendance.clone(),
    )?;
    conversation.load().await.context("loading conversation")?;

    println!("palaver-repl — /reset clears, /status probes the attendance API, /quit exits");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "" => {}
            "/quit" => break,
            "/reset" => {
                conversation.reset().await;
                println!("conversation cleared");
            }
            "/status" => match attendance.status().await {
                Ok(value) => println!("{value}"),
                Err(e) => eprintln!("! {e}"),
            },
            text => conversation.send(text).await,
        }
    }

    Ok(())
}
