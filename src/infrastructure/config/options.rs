//! Section/option store plugins read their settings from

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use crate::application::errors::ConfigError;

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Outcome of an option lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Value present in the store
    Stored(String),
    /// Option was missing; the supplied default was returned (and recorded)
    Defaulted(String),
    /// Option was missing and no default was supplied
    Missing,
}

impl OptionValue {
    pub fn into_option(self) -> Option<String> {
        match self {
            OptionValue::Stored(v) | OptionValue::Defaulted(v) => Some(v),
            OptionValue::Missing => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, OptionValue::Defaulted(_))
    }
}

/// File-backed key-value store organised in named sections.
///
/// The file is a YAML mapping of section -> option -> value. Defaults handed
/// to [`OptionStore::get`] for missing options are written back to the file.
pub struct OptionStore {
    path: Option<PathBuf>,
    sections: Mutex<Sections>,
}

impl OptionStore {
    /// Store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            path: None,
            sections: Mutex::new(Sections::new()),
        }
    }

    /// Load the store strictly; a missing file is an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let sections = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Sections::new()
            } else {
                serde_yaml::from_str(&content)
                    .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?
            }
        } else {
            Sections::new()
        };

        Ok(Self {
            path: Some(path),
            sections: Mutex::new(sections),
        })
    }

    /// Load the store, falling back to an empty one if the file is unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::info!("Using option store {}", path.display());
        match Self::load(&path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Unable to read option store, starting empty: {}", e);
                Self {
                    path: Some(path),
                    sections: Mutex::new(Sections::new()),
                }
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up `option` in `section`, falling back to `default`
    pub fn get(&self, section: &str, option: &str, default: Option<&str>) -> OptionValue {
        let mut sections = self.sections.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(value) = sections.get(section).and_then(|s| s.get(option)) {
            return OptionValue::Stored(value.clone());
        }

        let Some(default) = default else {
            tracing::info!(section, option, "No value configured and no default given");
            return OptionValue::Missing;
        };

        tracing::info!(section, option, default, "Option missing, recording default");
        sections
            .entry(section.to_string())
            .or_default()
            .insert(option.to_string(), default.to_string());
        if let Err(e) = self.persist(&sections) {
            tracing::warn!("Unable to write default for [{}] {}: {}", section, option, e);
        }

        OptionValue::Defaulted(default.to_string())
    }

    /// Store a value and write the file
    pub fn set(&self, section: &str, option: &str, value: &str) -> Result<(), ConfigError> {
        let mut sections = self.sections.lock().unwrap_or_else(|e| e.into_inner());
        sections
            .entry(section.to_string())
            .or_default()
            .insert(option.to_string(), value.to_string());
        self.persist(&sections)
    }

    /// All options of one section
    pub fn section(&self, section: &str) -> BTreeMap<String, String> {
        let sections = self.sections.lock().unwrap_or_else(|e| e.into_inner());
        sections.get(section).cloned().unwrap_or_default()
    }

    fn persist(&self, sections: &Sections) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        let yaml = serde_yaml::to_string(sections).map_err(|e| ConfigError::Write(e.to_string()))?;
        std::fs::write(path, yaml).map_err(|e| ConfigError::Write(e.to_string()))
    }
}

impl Default for OptionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
