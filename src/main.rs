use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use doddle::application::services::{SessionBuilder, SessionSettings};
use doddle::domain::traits::MessagingService;
use doddle::infrastructure::adapters::{ConsoleAdapter, SlackAdapter};
use doddle::infrastructure::config::{Config, OptionStore};
use doddle::infrastructure::plugins::PluginLoader;

#[derive(Parser)]
#[command(name = "doddle")]
#[command(about = "A small plugin-driven chat bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Slack bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if !run_bot(cli.config, cli.token) {
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("doddle v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(config_path: &str) -> Config {
    if !std::path::Path::new(config_path).exists() {
        return Config::load_env();
    }

    match Config::load(config_path) {
        Ok(mut config) => {
            config.apply_env();
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        }
    }
}

fn select_adapter(config: &Config, token_override: Option<String>) -> Arc<dyn MessagingService> {
    let token = token_override.or_else(|| config.slack_token().map(str::to_string));

    match token {
        Some(token) => {
            let mut adapter = SlackAdapter::new(token);
            if let Some(slack) = &config.adapters.slack {
                if let Some(api_base) = &slack.api_base {
                    adapter = adapter.with_api_base(api_base);
                }
                if let Some(bot_id) = &slack.bot_id {
                    adapter = adapter.with_bot_id(bot_id);
                }
            }
            Arc::new(adapter)
        }
        None => {
            if !config.adapters.console.as_ref().map_or(true, |c| c.enabled) {
                tracing::warn!("No Slack token and console adapter disabled; falling back to console");
            }
            Arc::new(ConsoleAdapter::new(config.bot.name.clone()))
        }
    }
}

/// Returns false when the session ended with an error
fn run_bot(config_path: String, token_override: Option<String>) -> bool {
    let config = load_config(&config_path);
    tracing::info!("Starting doddle: {}", config.bot.name);

    let options = Arc::new(OptionStore::open(&config.bot.options_file));
    let mut builder = SessionBuilder::new(SessionSettings::from_config(&config), options);

    let loader = PluginLoader::new(&config.plugins.directory)
        .with_auto_load(config.plugins.auto_load)
        .with_enabled(config.plugins.enabled.iter().cloned());
    let loaded = loader.load_into(&mut builder);
    tracing::info!("Plugin system initialized with {} plugins", loaded);

    let service = select_adapter(&config, token_override);
    tracing::info!("Using {} adapter", service.platform());
    let mut session = builder.build(service);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return false;
        }
    };

    rt.block_on(async {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutting down...");
                on_signal.cancel();
            }
        });

        match session.run(cancel).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Session ended: {}", e);
                false
            }
        }
    })
}

fn init_config() {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => {
            eprintln!("Failed to render config: {}", e);
            std::process::exit(1);
        }
    }
}
