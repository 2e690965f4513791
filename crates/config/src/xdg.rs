//! XDG Base Directory support for panelnav.

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "panelnav";

/// Get the configuration directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME/panelnav` or `~/.config/panelnav`.
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .context("Failed to determine config directory")
}

/// Get the data directory following XDG conventions.
///
/// Returns `$XDG_DATA_HOME/panelnav` or `~/.local/share/panelnav`.
pub fn get_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|p| p.join(APP_NAME))
        .context("Failed to determine data directory")
}

/// Get the cache directory following XDG conventions.
///
/// Log files default to `$XDG_CACHE_HOME/panelnav/panelnav.log`.
pub fn get_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|p| p.join(APP_NAME))
        .context("Failed to determine cache directory")
}
