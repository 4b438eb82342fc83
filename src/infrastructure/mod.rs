//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading and the plugin option store
//! - Adapters: Platform integrations (Slack, console)
//! - Plugins: Plugin manifest discovery

pub mod adapters;
pub mod config;
pub mod plugins;
