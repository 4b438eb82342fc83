//! Application layer errors

use std::time::Duration;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// The service answered but refused the request
    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited, retry after {0:?}")]
    RateLimited(Duration),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether the error means the live connection is gone and the session
    /// has to go back through the handshake.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            BotError::Disconnected(_) | BotError::Network(_) | BotError::Auth(_)
        )
    }
}

/// Command parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Ambiguous value for '{key}': {tokens:?}")]
    AmbiguousMatch { key: String, tokens: Vec<String> },
}

/// Plugin discovery and execution errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("Load failed: {0}")]
    Load(String),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Plugin '{0}' panicked")]
    Panicked(String),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Reply failed: {0}")]
    Reply(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Read error: {0}")]
    Read(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Write error: {0}")]
    Write(String),
}
