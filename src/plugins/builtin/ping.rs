use std::sync::Arc;
use async_trait::async_trait;
use crate::application::errors::PluginError;
use crate::application::services::SessionBuilder;
use crate::plugins::{Plugin, PluginContext};

pub struct PingPlugin;

pub fn create() -> Arc<dyn Plugin> {
    Arc::new(PingPlugin)
}

#[async_trait]
impl Plugin for PingPlugin {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Liveness check"
    }

    fn init(&self, bot: &mut SessionBuilder) -> Result<(), PluginError> {
        bot.register_command("ping", "checks the bot is alive");
        Ok(())
    }

    async fn on_command(
        &self,
        ctx: &PluginContext,
        channel: &str,
        tokens: &[String],
    ) -> Result<(), PluginError> {
        if !matches!(tokens.first(), Some(t) if t.eq_ignore_ascii_case("ping")) {
            return Ok(());
        }

        let reply = ctx
            .get_option("ping", "reply", Some("pong"))
            .await
            .unwrap_or_else(|| "pong".to_string());
        ctx.reply_to_channel(channel, &reply, None)
            .await
            .map_err(|e| PluginError::Reply(e.to_string()))
    }
}
