use serde::{Deserialize, Serialize};

/// A channel as enumerated by the messaging service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_member: bool,
}

impl ChannelInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_member: true,
        }
    }
}

/// Who the bot is on the service, as returned by the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: String,
    pub name: String,
}

impl BotIdentity {
    /// The form other users type to address the bot directly
    pub fn mention_token(&self) -> String {
        format!("<@{}>", self.id)
    }
}
