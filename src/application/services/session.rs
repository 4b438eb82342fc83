//! Connection session - Owns the live connection and drives the receive loop

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::errors::{BotError, PluginError};
use crate::application::messaging::{Classification, CommandParser, CommandRequest, MessageClassifier};
use crate::domain::entities::{BotIdentity, Event};
use crate::domain::traits::MessagingService;
use crate::infrastructure::config::{Config, OptionStore};
use crate::plugins::{BroadcastReport, Plugin, PluginContext, PluginRegistry};
use super::CommandCatalog;

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Exponential backoff between handshake attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// 0 retries forever
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }

    pub fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts != 0 && failures >= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            max_attempts: 0,
        }
    }
}

/// Tunables for a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub bot_name: String,
    pub action_char: String,
    pub poll_interval: Duration,
    pub reconnect: ReconnectPolicy,
}

impl SessionSettings {
    pub fn new(action_char: impl Into<String>) -> Self {
        Self {
            bot_name: "doddle".to_string(),
            action_char: action_char.into(),
            poll_interval: Duration::from_secs(1),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            bot_name: config.bot.name.clone(),
            action_char: config.bot.action_character.clone(),
            poll_interval: config.poll_interval(),
            reconnect: ReconnectPolicy {
                initial_backoff: Duration::from_millis(config.reconnect.initial_backoff_ms),
                max_backoff: Duration::from_millis(config.reconnect.max_backoff_ms),
                max_attempts: config.reconnect.max_attempts,
            },
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }
}

/// Collects commands and plugins before the session goes live
pub struct SessionBuilder {
    settings: SessionSettings,
    catalog: CommandCatalog,
    registry: PluginRegistry,
    options: Arc<OptionStore>,
}

impl SessionBuilder {
    pub fn new(settings: SessionSettings, options: Arc<OptionStore>) -> Self {
        let catalog = CommandCatalog::new(settings.action_char.clone());
        Self {
            settings,
            catalog,
            registry: PluginRegistry::new(),
            options,
        }
    }

    /// Add a line to the help listing
    pub fn register_command(&mut self, example: impl Into<String>, about: impl Into<String>) {
        self.catalog.register(example, about);
    }

    /// Add a plugin to the broadcast list
    pub fn register_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        self.registry.register(plugin);
    }

    /// Run the plugin's `init` and register it
    pub fn install(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        plugin.init(self)?;
        self.register_plugin(plugin);
        Ok(())
    }

    pub fn get_option(&self, section: &str, option: &str, default: Option<&str>) -> Option<String> {
        self.options.get(section, option, default).into_option()
    }

    pub fn action_char(&self) -> &str {
        &self.settings.action_char
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn build(self, service: Arc<dyn MessagingService>) -> ConnectionSession {
        let classifier = MessageClassifier::new(self.settings.action_char.clone());
        let context = PluginContext::new(service, self.catalog, self.options);
        ConnectionSession {
            state: SessionState::Disconnected,
            settings: self.settings,
            registry: self.registry,
            classifier,
            context,
            identity: None,
        }
    }
}

/// The live connection plus its receive loop
pub struct ConnectionSession {
    state: SessionState,
    settings: SessionSettings,
    registry: PluginRegistry,
    classifier: MessageClassifier,
    context: PluginContext,
    identity: Option<BotIdentity>,
}

impl ConnectionSession {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> Option<&BotIdentity> {
        self.identity.as_ref()
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// One handshake attempt.
    ///
    /// On success the session is Connected and the channel directory has been
    /// rebuilt; on failure it stays Connecting.
    pub async fn start(&mut self) -> Result<(), BotError> {
        self.state = SessionState::Connecting;
        let platform = self.context.service().platform().to_string();
        info!("Connecting to {}...", platform);

        let identity = match self.context.service().connect().await {
            Ok(identity) => identity,
            Err(e) => {
                error!("{} has disconnected... {}", self.settings.bot_name, e);
                return Err(e);
            }
        };

        info!(bot_id = %identity.id, "Connected to {} as {}", platform, identity.name);
        self.classifier =
            MessageClassifier::new(self.settings.action_char.clone()).with_identity(&identity);
        self.identity = Some(identity);
        self.rebuild_directory().await;
        self.state = SessionState::Connected;
        Ok(())
    }

    async fn rebuild_directory(&self) {
        info!("Building channel directory.");
        match self.context.service().list_channels().await {
            Ok(channels) => {
                let count = self.context.rebuild_directory(channels);
                info!("Channel directory built. {} channels.", count);
            }
            Err(e) => {
                self.context.clear_directory();
                error!("Unable to create channel directory: {}", e);
            }
        }
    }

    /// Handshake until it succeeds, backing off between attempts.
    ///
    /// Returns `Ok(false)` if cancelled first, and an error once a bounded
    /// policy runs out of attempts.
    pub async fn connect_with_retry(&mut self, cancel: &CancellationToken) -> Result<bool, BotError> {
        let mut failures = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Ok(false);
            }

            let err = match self.start().await {
                Ok(()) => return Ok(true),
                Err(e) => e,
            };

            failures += 1;
            if self.settings.reconnect.exhausted(failures) {
                return Err(BotError::Network(format!(
                    "giving up after {} connection attempts: {}",
                    failures, err
                )));
            }

            let delay = self.settings.reconnect.delay(failures);
            info!(attempt = failures, delay_ms = delay.as_millis() as u64, "Attempting to reconnect");
            tokio::select! {
                _ = cancel.cancelled() => return Ok(false),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One poll cycle: read pending events and dispatch what qualifies.
    ///
    /// Returns the number of commands broadcast. A lost connection moves the
    /// session back to Connecting and is returned as the error; a rate limit
    /// is returned too but leaves the session Connected.
    pub async fn tick(&mut self) -> Result<usize, BotError> {
        if self.state != SessionState::Connected {
            return Err(BotError::Internal("session is not connected".to_string()));
        }

        let batch = self.context.service().read_events().await;
        match batch {
            Ok(events) => Ok(self.process_batch(&events).await),
            Err(e) if e.is_disconnect() => {
                self.state = SessionState::Connecting;
                Err(e)
            }
            Err(e @ BotError::RateLimited(_)) => Err(e),
            Err(e) => {
                warn!("Unable to parse events: {}", e);
                Ok(0)
            }
        }
    }

    /// Classify a batch and dispatch every qualifying event in order
    pub async fn process_batch(&self, events: &[Event]) -> usize {
        let mut dispatched = 0;
        let mut rest = events;

        while let Some((index, classification)) = self.classifier.classify_from(rest) {
            match classification {
                Classification::Command(request) => {
                    self.dispatch(&request).await;
                    dispatched += 1;
                }
                Classification::Help { user, channel } => {
                    self.respond_help(user.as_deref(), &channel).await;
                }
            }
            rest = &rest[index + 1..];
        }

        dispatched
    }

    /// Split a command into tokens and broadcast it to every plugin
    pub async fn dispatch(&self, request: &CommandRequest) -> BroadcastReport {
        debug!("Handling command: {} in channel: {}", request.text, request.channel);
        let tokens = CommandParser::tokenize(&request.text);
        self.registry
            .broadcast(&self.context, &request.channel, &tokens)
            .await
    }

    async fn respond_help(&self, user: Option<&str>, channel: &str) {
        let recipient = user.unwrap_or(channel);
        let listing = self.context.catalog().render();
        if let Err(e) = self.context.reply_to_channel(recipient, &listing, None).await {
            warn!(recipient, "Unable to send help: {}", e);
        }
    }

    /// Send a message through the live connection
    pub async fn reply(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<&serde_json::Value>,
    ) -> Result<(), BotError> {
        self.context.reply_to_channel(channel, text, attachments).await
    }

    /// Connect, poll until cancelled, reconnecting whenever the link drops.
    ///
    /// Disconnects since the last successful tick back off with the same
    /// policy as failed handshakes.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), BotError> {
        let mut disconnects = 0u32;

        'session: loop {
            if disconnects > 0 {
                let delay = self.settings.reconnect.delay(disconnects);
                info!(disconnects, delay_ms = delay.as_millis() as u64, "Waiting before reconnect");
                tokio::select! {
                    _ = cancel.cancelled() => break 'session,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            match self.connect_with_retry(&cancel).await {
                Ok(true) => {}
                Ok(false) => break 'session,
                Err(e) => {
                    self.state = SessionState::Disconnected;
                    return Err(e);
                }
            }

            info!("Starting message loop...");
            loop {
                if cancel.is_cancelled() {
                    break 'session;
                }

                let pause = match self.tick().await {
                    Ok(_) => {
                        disconnects = 0;
                        self.settings.poll_interval
                    }
                    Err(BotError::RateLimited(wait)) => {
                        warn!(wait_ms = wait.as_millis() as u64, "Rate limited, skipping ticks");
                        wait.max(self.settings.poll_interval)
                    }
                    Err(e) => {
                        error!(
                            "{} has disconnected... Attempting to reconnect: {}",
                            self.settings.bot_name, e
                        );
                        disconnects = disconnects.saturating_add(1);
                        continue 'session;
                    }
                };

                tokio::select! {
                    _ = cancel.cancelled() => break 'session,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        self.state = SessionState::Disconnected;
        info!("Session stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
            max_attempts: 0,
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
        assert_eq!(policy.delay(4), Duration::from_millis(500));
        assert_eq!(policy.delay(40), Duration::from_millis(500));
    }

    #[test]
    fn test_unbounded_policy_never_exhausts() {
        let policy = ReconnectPolicy::default();
        assert!(!policy.exhausted(u32::MAX));

        let bounded = ReconnectPolicy { max_attempts: 3, ..ReconnectPolicy::default() };
        assert!(!bounded.exhausted(2));
        assert!(bounded.exhausted(3));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.bot.action_character = "?".to_string();
        config.reconnect.max_attempts = 5;

        let settings = SessionSettings::from_config(&config);
        assert_eq!(settings.action_char, "?");
        assert_eq!(settings.reconnect.max_attempts, 5);
        assert_eq!(settings.poll_interval, Duration::from_millis(1_000));
    }
}
