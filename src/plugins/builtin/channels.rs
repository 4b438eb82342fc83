use std::sync::Arc;
use async_trait::async_trait;
use crate::application::errors::PluginError;
use crate::application::services::SessionBuilder;
use crate::domain::entities::CommandSchema;
use crate::plugins::{Plugin, PluginContext};

/// Lists the channel directory, or resolves one channel name to its id
pub struct ChannelsPlugin {
    schema: CommandSchema,
}

pub fn create() -> Arc<dyn Plugin> {
    Arc::new(ChannelsPlugin {
        schema: CommandSchema::new().option("command", ["channels", "channel"]),
    })
}

#[async_trait]
impl Plugin for ChannelsPlugin {
    fn name(&self) -> &str {
        "channels"
    }

    fn description(&self) -> &str {
        "Channel directory lookups"
    }

    fn init(&self, bot: &mut SessionBuilder) -> Result<(), PluginError> {
        bot.register_command("channels", "lists the channels the bot knows about");
        bot.register_command("channel <name>", "shows the id of channel <name>");
        Ok(())
    }

    async fn on_command(
        &self,
        ctx: &PluginContext,
        channel: &str,
        tokens: &[String],
    ) -> Result<(), PluginError> {
        if !matches!(tokens.first(), Some(t) if t == "channels" || t == "channel") {
            return Ok(());
        }

        let parsed = ctx.parse_command(&self.schema, tokens)?;
        let reply = match parsed.wildcard(0) {
            Some(name) => match ctx.lookup_channel(name) {
                Some(id) => format!("#{} is {}", name.trim_start_matches('#'), id),
                None => format!("I don't know a channel called {}", name),
            },
            None => {
                let directory = ctx.channel_directory();
                if directory.is_empty() {
                    "I don't know any channels yet.".to_string()
                } else {
                    directory
                        .iter()
                        .map(|(name, id)| format!("#{} ({})", name, id))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
        };

        ctx.reply_to_channel(channel, &reply, None)
            .await
            .map_err(|e| PluginError::Reply(e.to_string()))
    }
}
