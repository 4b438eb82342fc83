//! Plugin discovery for doddle
//!
//! The plugin directory holds small YAML manifests, one per plugin to enable.
//! Manifests only select plugins; the code itself is compiled in and looked
//! up by name in [`crate::plugins::builtin`].

pub mod loader;
pub mod manifest;

pub use loader::PluginLoader;
pub use manifest::PluginManifest;
