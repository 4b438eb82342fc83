//! Plugin loader - Resolves plugin manifests to built-in plugin factories

use std::path::{Path, PathBuf};
use crate::application::errors::PluginError;
use crate::application::services::SessionBuilder;
use crate::plugins::builtin;
use super::manifest::PluginManifest;

/// File stems that never name a plugin
const IGNORED_STEMS: &[&str] = &["__init__", "mod"];

/// Plugin loader
pub struct PluginLoader {
    plugin_dir: PathBuf,
    auto_load: bool,
    enabled: Vec<String>,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            auto_load: true,
            enabled: Vec::new(),
        }
    }

    /// Turn directory scanning on or off
    pub fn with_auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }

    /// Plugins loaded regardless of what the directory contains
    pub fn with_enabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled = names.into_iter().map(Into::into).collect();
        self
    }

    /// Manifest paths under the plugin directory, sorted, with ignored names
    /// filtered out
    pub fn discover(&self) -> Result<Vec<PathBuf>, PluginError> {
        if !self.plugin_dir.exists() {
            tracing::warn!("Plugin directory does not exist: {}", self.plugin_dir.display());
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.plugin_dir)
            .map_err(|e| PluginError::Discovery(format!("Failed to read plugin directory: {}", e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if path.is_file() && is_manifest(&path) {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(sanitize(paths))
    }

    /// Plugin names in load order: `enabled` first, then discovered manifests.
    /// Each name appears once.
    pub fn candidate_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name.to_string());
            }
        };

        for name in &self.enabled {
            push(name);
        }

        if self.auto_load {
            let paths = match self.discover() {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::warn!("{}", e);
                    Vec::new()
                }
            };

            for path in paths {
                match PluginManifest::from_file(&path) {
                    Ok(manifest) if manifest.enabled => push(&manifest.name),
                    Ok(manifest) => {
                        tracing::debug!(plugin = %manifest.name, "Plugin disabled by manifest");
                    }
                    Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
                }
            }
        }

        names
    }

    /// Construct every candidate plugin and install it into the builder.
    /// Returns the number of plugins installed.
    pub fn load_into(&self, builder: &mut SessionBuilder) -> usize {
        let mut loaded = 0;

        for name in self.candidate_names() {
            let Some(factory) = builtin::lookup(&name) else {
                tracing::warn!("{}", PluginError::UnknownPlugin(name));
                continue;
            };

            let plugin = factory();
            match builder.install(plugin) {
                Ok(()) => {
                    tracing::info!(plugin = %name, "Loaded plugin");
                    loaded += 1;
                }
                Err(e) => tracing::warn!(plugin = %name, "Failed to initialise plugin: {}", e),
            }
        }

        if loaded == 0 {
            tracing::warn!("No plugins loaded, running with an empty registry");
        }
        loaded
    }
}

fn is_manifest(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Drop initializer and test files
fn sanitize(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                return false;
            };
            !stem.starts_with('.')
                && !IGNORED_STEMS.contains(&stem)
                && !stem.to_ascii_lowercase().contains("test")
        })
        .collect()
}
