//! Message classifier - Picks out events addressed to the bot

use crate::domain::entities::{BotIdentity, Event};

/// Command text extracted from an event, with the channel it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub text: String,
    pub channel: String,
}

/// What the classifier decided about an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A command to broadcast to plugins
    Command(CommandRequest),
    /// A request for the help listing
    Help {
        user: Option<String>,
        channel: String,
    },
}

/// Decides whether events are commands for this bot.
///
/// An event qualifies when its text starts with the action character or
/// contains the bot's mention token anywhere.
#[derive(Debug, Clone)]
pub struct MessageClassifier {
    action_char: String,
    mention_token: Option<String>,
    self_id: Option<String>,
}

impl MessageClassifier {
    pub fn new(action_char: impl Into<String>) -> Self {
        Self {
            action_char: action_char.into(),
            mention_token: None,
            self_id: None,
        }
    }

    pub fn with_mention(mut self, mention_token: impl Into<String>) -> Self {
        self.mention_token = Some(mention_token.into());
        self
    }

    /// Use the handshake identity: its mention form triggers commands and its
    /// own messages are ignored.
    pub fn with_identity(mut self, identity: &BotIdentity) -> Self {
        self.mention_token = Some(identity.mention_token());
        self.self_id = Some(identity.id.clone());
        self
    }

    pub fn action_char(&self) -> &str {
        &self.action_char
    }

    /// First qualifying event of the batch
    pub fn classify(&self, events: &[Event]) -> Option<Classification> {
        self.classify_from(events).map(|(_, c)| c)
    }

    /// First qualifying event of the batch together with its index
    pub fn classify_from(&self, events: &[Event]) -> Option<(usize, Classification)> {
        events
            .iter()
            .enumerate()
            .find_map(|(i, event)| self.classify_event(event).map(|c| (i, c)))
    }

    fn classify_event(&self, event: &Event) -> Option<Classification> {
        let text = event.text.as_deref()?;
        let Some(channel) = event.channel.as_deref() else {
            tracing::debug!("Skipping event without channel");
            return None;
        };

        if let (Some(me), Some(user)) = (self.self_id.as_deref(), event.user.as_deref()) {
            if me == user {
                return None;
            }
        }

        if !self.action_char.is_empty() && text.starts_with(&self.action_char) {
            let command = remainder(text, &self.action_char)?;
            if command.to_lowercase() == "help" {
                return Some(Classification::Help {
                    user: event.user.clone(),
                    channel: channel.to_string(),
                });
            }
            return Some(Classification::Command(CommandRequest {
                text: command.to_string(),
                channel: channel.to_string(),
            }));
        }

        let mention = self.mention_token.as_deref().filter(|m| !m.is_empty())?;
        if text.contains(mention) {
            let command = remainder(text, mention)?;
            return Some(Classification::Command(CommandRequest {
                text: command.to_string(),
                channel: channel.to_string(),
            }));
        }

        None
    }
}

/// Trimmed text after the first occurrence of `marker`, if any is left
fn remainder<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = text.split_once(marker)?;
    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}
