//! Console adapter for development/testing

use async_trait::async_trait;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use crate::application::errors::BotError;
use crate::domain::entities::{BotIdentity, ChannelInfo, Event};
use crate::domain::traits::MessagingService;

/// Channel id (and name) every console line is posted in
pub const CONSOLE_CHANNEL: &str = "console";

/// Console adapter: stdin lines become events, replies are printed
pub struct ConsoleAdapter {
    identity: BotIdentity,
    inbox: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    closed: AtomicBool,
}

impl ConsoleAdapter {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            identity: BotIdentity {
                id: "doddle".to_string(),
                name: bot_name.into(),
            },
            inbox: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Adapter fed from an existing line channel instead of stdin
    pub fn with_lines(bot_name: impl Into<String>, lines: mpsc::UnboundedReceiver<String>) -> Self {
        let adapter = Self::new(bot_name);
        *adapter.inbox.lock().unwrap_or_else(|e| e.into_inner()) = Some(lines);
        adapter
    }

    fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });
        rx
    }
}

#[async_trait]
impl MessagingService for ConsoleAdapter {
    async fn connect(&self) -> Result<BotIdentity, BotError> {
        let mut inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
        if inbox.is_none() {
            tracing::info!("Starting console bot (dev mode)");
            *inbox = Some(Self::spawn_stdin_reader());
        }
        Ok(self.identity.clone())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, BotError> {
        Ok(vec![ChannelInfo::new(CONSOLE_CHANNEL, CONSOLE_CHANNEL)])
    }

    async fn read_events(&self) -> Result<Vec<Event>, BotError> {
        let mut inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
        let Some(rx) = inbox.as_mut() else {
            return Err(BotError::Disconnected("console is not connected".to_string()));
        };

        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        events.push(Event::message(CONSOLE_CHANNEL, "console", line));
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if !self.closed.swap(true, Ordering::Relaxed) {
                        tracing::info!("Console input closed");
                    }
                    break;
                }
            }
        }
        Ok(events)
    }

    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<&serde_json::Value>,
    ) -> Result<(), BotError> {
        println!("[BOT -> {}] {}", channel, text);
        if let Some(attachments) = attachments {
            let rendered = serde_json::to_string_pretty(attachments)
                .map_err(|e| BotError::Parse(e.to_string()))?;
            println!("  [Attachments] {}", rendered);
        }
        Ok(())
    }

    fn platform(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_become_console_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let adapter = ConsoleAdapter::with_lines("doddle", rx);
        adapter.connect().await.unwrap();

        tx.send("!ping".to_string()).unwrap();
        tx.send("   ".to_string()).unwrap();
        tx.send("hello".to_string()).unwrap();

        let events = adapter.read_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].text.as_deref(), Some("!ping"));
        assert_eq!(events[0].channel.as_deref(), Some(CONSOLE_CHANNEL));
        assert!(adapter.read_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_input_yields_empty_batches() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        let adapter = ConsoleAdapter::with_lines("doddle", rx);
        assert!(adapter.read_events().await.unwrap().is_empty());
        assert!(adapter.read_events().await.unwrap().is_empty());
    }
}
