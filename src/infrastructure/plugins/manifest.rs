//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use crate::application::errors::PluginError;

/// A `*.yaml` file in the plugin directory naming a plugin to load
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Built-in plugin to construct (required)
    pub name: String,

    pub description: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl PluginManifest {
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, PluginError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Load(format!("Failed to read manifest {}: {}", path.display(), e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| PluginError::Load(format!("Failed to parse manifest {}: {}", path.display(), e)))
    }
}
