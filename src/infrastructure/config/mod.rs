//! Configuration management

pub mod options;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

pub use options::{OptionStore, OptionValue};

/// Environment variable holding the bot's user id
pub const ENV_BOT_ID: &str = "BOT_ID";
/// Environment variable holding the Slack bot token
pub const ENV_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";
/// Environment variable overriding the action character
pub const ENV_ACTION_CHARACTER: &str = "BOT_ACTION_CHARACTER";

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    pub plugins: PluginConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub action_character: String,
    pub poll_interval_ms: u64,
    pub options_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReconnectConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// 0 retries forever
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub auto_load: bool,
    #[serde(default)]
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub slack: Option<SlackConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlackConfig {
    pub enabled: bool,
    pub token: Option<String>,
    pub bot_id: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
            max_attempts: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "doddle".to_string(),
                action_character: "!".to_string(),
                poll_interval_ms: 1_000,
                options_file: PathBuf::from("data/doddle.yaml"),
            },
            reconnect: ReconnectConfig::default(),
            plugins: PluginConfig {
                directory: PathBuf::from("./plugins"),
                auto_load: true,
                enabled: vec!["ping".to_string(), "channels".to_string()],
            },
            adapters: AdaptersConfig {
                slack: Some(SlackConfig {
                    enabled: false,
                    token: None,
                    bot_id: None,
                    api_base: None,
                }),
                console: Some(ConsoleConfig { enabled: true }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with credentials from the environment
    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Overlay environment credentials onto this config
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ENV_BOT_TOKEN) {
            let slack = self.adapters.slack.get_or_insert(SlackConfig {
                enabled: true,
                token: None,
                bot_id: None,
                api_base: None,
            });
            slack.token = Some(token);
            slack.enabled = true;
        }

        if let Ok(bot_id) = std::env::var(ENV_BOT_ID) {
            if let Some(ref mut slack) = self.adapters.slack {
                slack.bot_id = Some(bot_id);
            }
        }

        if let Ok(action) = std::env::var(ENV_ACTION_CHARACTER) {
            if !action.is_empty() {
                self.bot.action_character = action;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.action_character.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.action-character".to_string()));
        }
        if self.reconnect.initial_backoff_ms > self.reconnect.max_backoff_ms {
            return Err(ConfigError::Parse(
                "reconnect.initial-backoff-ms exceeds reconnect.max-backoff-ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Slack token, if the Slack adapter is enabled and has one
    pub fn slack_token(&self) -> Option<&str> {
        self.adapters
            .slack
            .as_ref()
            .filter(|s| s.enabled)
            .and_then(|s| s.token.as_deref())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.bot.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("action-character"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.bot.action_character, "!");
        assert_eq!(parsed.plugins.enabled, vec!["ping", "channels"]);
    }

    #[test]
    fn test_reconnect_section_is_optional() {
        let yaml = r#"
bot:
  name: doddle
  action-character: "?"
  poll-interval-ms: 250
  options-file: data/doddle.yaml
plugins:
  directory: ./plugins
  auto-load: false
adapters:
  slack: null
  console:
    enabled: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.reconnect.max_attempts, 0);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert!(config.plugins.enabled.is_empty());
        assert!(config.slack_token().is_none());
    }

    #[test]
    fn test_validate_rejects_blank_action_character() {
        let mut config = Config::default();
        config.bot.action_character = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_slack_token_requires_enabled_adapter() {
        let mut config = Config::default();
        if let Some(ref mut slack) = config.adapters.slack {
            slack.token = Some("xoxb-test".to_string());
        }
        assert!(config.slack_token().is_none());

        if let Some(ref mut slack) = config.adapters.slack {
            slack.enabled = true;
        }
        assert_eq!(config.slack_token(), Some("xoxb-test"));
    }
}
