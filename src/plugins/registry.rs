//! Plugin registry - Ordered list of plugins every command is broadcast to

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::application::errors::PluginError;
use super::context::PluginContext;
use super::trait_def::Plugin;

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Names of plugins whose handler returned an error or panicked
    pub failed: Vec<String>,
}

/// Registry of plugins, kept in registration order
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. There is no unregister and no duplicate check.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        info!("Registering plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Hand `(channel, tokens)` to every plugin in registration order.
    ///
    /// Each handler runs on its own task and is awaited before the next one
    /// starts, so a handler that errors or panics is logged and the remaining
    /// plugins still receive the command.
    pub async fn broadcast(
        &self,
        ctx: &PluginContext,
        channel: &str,
        tokens: &[String],
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for plugin in &self.plugins {
            let name = plugin.name().to_string();
            let task = {
                let plugin = Arc::clone(plugin);
                let ctx = ctx.clone();
                let channel = channel.to_string();
                let tokens = tokens.to_vec();
                tokio::spawn(async move { plugin.on_command(&ctx, &channel, &tokens).await })
            };

            match task.await {
                Ok(Ok(())) => {
                    debug!(plugin = %name, "Delivered command");
                    report.delivered += 1;
                }
                Ok(Err(e)) => {
                    warn!(plugin = %name, channel, "Plugin failed: {}", e);
                    report.failed.push(name);
                }
                Err(e) if e.is_panic() => {
                    error!(channel, "{}", PluginError::Panicked(name.clone()));
                    report.failed.push(name);
                }
                Err(e) => {
                    error!(plugin = %name, channel, "Plugin task was cancelled: {}", e);
                    report.failed.push(name);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use crate::application::errors::BotError;
    use crate::application::services::CommandCatalog;
    use crate::domain::entities::{BotIdentity, ChannelInfo, Event};
    use crate::domain::traits::MessagingService;
    use crate::infrastructure::config::OptionStore;

    struct SilentService;

    #[async_trait]
    impl MessagingService for SilentService {
        async fn connect(&self) -> Result<BotIdentity, BotError> {
            Ok(BotIdentity { id: "B".into(), name: "bot".into() })
        }
        async fn list_channels(&self) -> Result<Vec<ChannelInfo>, BotError> {
            Ok(Vec::new())
        }
        async fn read_events(&self) -> Result<Vec<Event>, BotError> {
            Ok(Vec::new())
        }
        async fn send_message(
            &self,
            _channel: &str,
            _text: &str,
            _attachments: Option<&serde_json::Value>,
        ) -> Result<(), BotError> {
            Ok(())
        }
        fn platform(&self) -> &str {
            "silent"
        }
    }

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Plugin for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn on_command(
            &self,
            _ctx: &PluginContext,
            channel: &str,
            tokens: &[String],
        ) -> Result<(), PluginError> {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}:{}", self.name, channel, tokens.join(" ")));
            if self.fail {
                return Err(PluginError::Execution("boom".into()));
            }
            Ok(())
        }
    }

    fn context() -> PluginContext {
        PluginContext::new(
            Arc::new(SilentService),
            CommandCatalog::new("!"),
            Arc::new(OptionStore::in_memory()),
        )
    }

    #[tokio::test]
    async fn test_broadcast_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        for name in ["first", "second", "third"] {
            registry.register(Arc::new(Recorder { name, seen: seen.clone(), fail: false }));
        }

        let tokens = vec!["restart".to_string(), "machine1".to_string()];
        let report = registry.broadcast(&context(), "C1", &tokens).await;

        assert_eq!(report.delivered, 3);
        assert!(report.failed.is_empty());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "first:C1:restart machine1",
                "second:C1:restart machine1",
                "third:C1:restart machine1",
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_plugin_does_not_stop_delivery() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(Recorder { name: "a", seen: seen.clone(), fail: false }));
        registry.register(Arc::new(Recorder { name: "b", seen: seen.clone(), fail: true }));
        registry.register(Arc::new(Recorder { name: "c", seen: seen.clone(), fail: false }));

        let report = registry.broadcast(&context(), "C1", &["x".to_string()]).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, vec!["b"]);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = PluginRegistry::new();
        let report = registry.broadcast(&context(), "C1", &[]).await;
        assert_eq!(report, BroadcastReport::default());
        assert!(registry.is_empty());
    }
}
