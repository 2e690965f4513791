//! Configuration structures for panelnav settings.

use serde::{Deserialize, Serialize};

use panelnav_core::{LayerId, StackMode};

use crate::defaults;

/// Application configuration with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Panel declaration table
    #[serde(default)]
    pub panels: Vec<PanelEntry>,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Name of the UI root panels are attached under
    #[serde(default = "default_root_name")]
    pub root_name: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log file path (optional, defaults to the cache directory)
    #[serde(default)]
    pub file_path: Option<String>,

    /// Minimum log level (debug, info, warn, error)
    #[serde(default = "default_min_level")]
    pub min_level: String,

    /// Number of entries kept in memory
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// One declared panel type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelEntry {
    /// Panel identity
    pub id: String,

    /// Asset path (defaults to the identity)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Default layer
    #[serde(default)]
    pub layer: LayerId,

    /// Stack mode (overlay, push, replace)
    #[serde(default)]
    pub mode: StackMode,

    /// Controller kind (defaults to the identity)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
}

impl PanelEntry {
    pub fn asset_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.id)
    }

    pub fn controller_name(&self) -> &str {
        self.controller.as_deref().unwrap_or(&self.id)
    }
}

// Default value functions for serde
fn default_root_name() -> String {
    defaults::ROOT_NAME.to_string()
}

fn default_min_level() -> String {
    defaults::MIN_LOG_LEVEL.to_string()
}

fn default_max_entries() -> usize {
    defaults::MAX_LOG_ENTRIES
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            root_name: default_root_name(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file_path: None,
            min_level: default_min_level(),
            max_entries: default_max_entries(),
        }
    }
}
