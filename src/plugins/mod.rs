//! Plugin system for doddle
//!
//! Plugins receive every command the bot recognises and decide for themselves
//! whether to act on it. Built-in plugins are registered from a static table.

pub mod builtin;
pub mod context;
pub mod registry;
pub mod trait_def;

pub use context::PluginContext;
pub use registry::{BroadcastReport, PluginRegistry};
pub use trait_def::{Plugin, PluginFactory};
