use std::sync::Arc;
use async_trait::async_trait;
use crate::application::errors::PluginError;
use crate::application::services::SessionBuilder;
use crate::plugins::{Plugin, PluginContext};

/// Repeats whatever follows `echo`
pub struct EchoPlugin;

pub fn create() -> Arc<dyn Plugin> {
    Arc::new(EchoPlugin)
}

#[async_trait]
impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Repeats text back into the channel"
    }

    fn init(&self, bot: &mut SessionBuilder) -> Result<(), PluginError> {
        bot.register_command("echo <text>", "repeats <text> back");
        Ok(())
    }

    async fn on_command(
        &self,
        ctx: &PluginContext,
        channel: &str,
        tokens: &[String],
    ) -> Result<(), PluginError> {
        let Some((first, rest)) = tokens.split_first() else {
            return Ok(());
        };
        if !first.eq_ignore_ascii_case("echo") || rest.is_empty() {
            return Ok(());
        }

        ctx.reply_to_channel(channel, &rest.join(" "), None)
            .await
            .map_err(|e| PluginError::Reply(e.to_string()))
    }
}
