//! Runtime API handed to plugin handlers

use std::sync::{Arc, RwLock};
use crate::application::errors::{BotError, CommandError};
use crate::application::messaging::CommandParser;
use crate::application::services::{ChannelDirectory, CommandCatalog};
use crate::domain::entities::{ChannelInfo, CommandSchema, ParsedCommand};
use crate::domain::traits::MessagingService;
use crate::infrastructure::config::OptionStore;

struct Shared {
    service: Arc<dyn MessagingService>,
    directory: RwLock<ChannelDirectory>,
    catalog: CommandCatalog,
    options: Arc<OptionStore>,
}

/// Cheap-to-clone handle plugins use to talk back to the session
#[derive(Clone)]
pub struct PluginContext {
    shared: Arc<Shared>,
}

impl PluginContext {
    pub fn new(
        service: Arc<dyn MessagingService>,
        catalog: CommandCatalog,
        options: Arc<OptionStore>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                service,
                directory: RwLock::new(ChannelDirectory::new()),
                catalog,
                options,
            }),
        }
    }

    /// Send a message into a channel
    pub async fn reply_to_channel(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<&serde_json::Value>,
    ) -> Result<(), BotError> {
        let preview: String = text.chars().take(100).collect();
        tracing::debug!(channel, "Replying: {}", preview);
        self.shared
            .service
            .send_message(channel, text, attachments)
            .await
            .map_err(|e| {
                tracing::error!(channel, "Failed to send message: {}", e);
                e
            })
    }

    /// Snapshot of the channel directory
    pub fn channel_directory(&self) -> ChannelDirectory {
        self.shared
            .directory
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn lookup_channel(&self, name: &str) -> Option<String> {
        self.shared
            .directory
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .lookup(name)
            .map(str::to_string)
    }

    /// Read a plugin option, recording `default` when it is missing.
    ///
    /// Recording a default writes the option file, so the lookup runs on the
    /// blocking pool.
    pub async fn get_option(
        &self,
        section: &str,
        option: &str,
        default: Option<&str>,
    ) -> Option<String> {
        let options = Arc::clone(&self.shared.options);
        let (section, option) = (section.to_string(), option.to_string());
        let fallback = default.map(str::to_string);
        let owned_default = fallback.clone();

        let lookup = tokio::task::spawn_blocking(move || {
            options.get(&section, &option, owned_default.as_deref())
        });
        match lookup.await {
            Ok(value) => value.into_option(),
            Err(e) => {
                tracing::warn!("Option lookup failed: {}", e);
                fallback
            }
        }
    }

    pub fn options(&self) -> &OptionStore {
        &self.shared.options
    }

    pub fn parse_command<S: AsRef<str>>(
        &self,
        schema: &CommandSchema,
        tokens: &[S],
    ) -> Result<ParsedCommand, CommandError> {
        CommandParser::parse(schema, tokens)
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.shared.catalog
    }

    pub fn action_character(&self) -> &str {
        self.shared.catalog.action_char()
    }

    pub(crate) fn service(&self) -> &Arc<dyn MessagingService> {
        &self.shared.service
    }

    pub(crate) fn rebuild_directory(&self, channels: Vec<ChannelInfo>) -> usize {
        let mut directory = self.shared.directory.write().unwrap_or_else(|e| e.into_inner());
        directory.rebuild(channels);
        directory.len()
    }

    pub(crate) fn clear_directory(&self) {
        self.shared
            .directory
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
