//! Plugin trait definitions

use std::sync::Arc;
use async_trait::async_trait;
use crate::application::errors::PluginError;
use crate::application::services::SessionBuilder;
use super::context::PluginContext;

/// Core plugin trait that all plugins must implement
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Called once before the plugin is registered; the place to register
    /// help entries and read options.
    fn init(&self, bot: &mut SessionBuilder) -> Result<(), PluginError> {
        let _ = bot;
        Ok(())
    }

    /// Handle a command broadcast. `tokens` is the whitespace-split command
    /// text; every plugin sees every command and ignores what it does not own.
    async fn on_command(
        &self,
        ctx: &PluginContext,
        channel: &str,
        tokens: &[String],
    ) -> Result<(), PluginError>;
}

/// Constructor for a plugin known at compile time
pub type PluginFactory = fn() -> Arc<dyn Plugin>;
