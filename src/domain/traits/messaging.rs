use async_trait::async_trait;
use crate::application::errors::BotError;
use crate::domain::entities::{BotIdentity, ChannelInfo, Event};

/// MessagingService trait - abstraction over the real-time messaging platform
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Perform the handshake and report who the bot is
    async fn connect(&self) -> Result<BotIdentity, BotError>;

    /// Enumerate channels visible to the bot
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, BotError>;

    /// Pull the batch of events that arrived since the previous call.
    ///
    /// A lost connection is reported as an error for which
    /// [`BotError::is_disconnect`] holds.
    async fn read_events(&self) -> Result<Vec<Event>, BotError>;

    /// Post a message to a channel (or user id)
    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<&serde_json::Value>,
    ) -> Result<(), BotError>;

    /// Platform name for logs
    fn platform(&self) -> &str;
}
