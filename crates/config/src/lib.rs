//! Configuration management for panelnav.
//!
//! Loads and saves the TOML configuration (general settings, logging and the
//! panel declaration table) following XDG directory conventions, and turns
//! the `[[panels]]` entries into a `DeclarationTable`.

mod settings;
mod xdg;

pub use settings::{Config, GeneralSettings, LoggingSettings, PanelEntry};
pub use xdg::{get_cache_dir, get_config_dir, get_data_dir};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use panelnav_core::{ControllerKind, DeclarationTable, PanelDeclaration};
use panelnav_logger::LogLevel;

/// Default values as constants
pub mod defaults {
    pub const ROOT_NAME: &str = "ui-root";
    pub const MIN_LOG_LEVEL: &str = "info";
    pub const MAX_LOG_ENTRIES: usize = 1000;
    pub const LOG_FILE_NAME: &str = "panelnav.log";
}

impl Config {
    /// Load configuration from the XDG config file.
    ///
    /// On first run, creates the file with default values.
    /// Missing keys are completed with defaults and written back.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if config_path.exists() {
            let original_content = std::fs::read_to_string(&config_path)?;
            let config = Self::validate_content(&original_content)?;

            let normalized_content = toml::to_string_pretty(&config)?;
            if original_content != normalized_content {
                config.save_to(&config_path)?;
            }

            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file without rewriting it.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::validate_content(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Save configuration to the XDG config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get path to config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(get_config_dir()?.join("config.toml"))
    }

    /// Parse and validate config content.
    pub fn validate_content(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;
        config.log_level()?;
        config.declarations()?;
        Ok(config)
    }

    /// Build the panel declaration table. Duplicate identities are rejected.
    pub fn declarations(&self) -> Result<DeclarationTable> {
        let mut table = DeclarationTable::new();
        for entry in &self.panels {
            table.declare(PanelDeclaration::new(
                entry.id.as_str(),
                entry.asset_path(),
                entry.layer,
                entry.mode,
            ))?;
        }
        Ok(table)
    }

    /// Distinct controller kinds referenced by the panel entries.
    pub fn controller_kinds(&self) -> Vec<ControllerKind> {
        let mut kinds: Vec<ControllerKind> = Vec::new();
        for entry in &self.panels {
            let kind = ControllerKind::owned(entry.controller_name());
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// Parsed minimum log level.
    pub fn log_level(&self) -> Result<LogLevel> {
        self.logging
            .min_level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!(e))
    }

    /// Log file path: configured value or the cache directory default.
    pub fn log_file_path(&self) -> Option<PathBuf> {
        match &self.logging.file_path {
            Some(path) => Some(PathBuf::from(path)),
            None => get_cache_dir()
                .ok()
                .map(|dir| dir.join(defaults::LOG_FILE_NAME)),
        }
    }
}
