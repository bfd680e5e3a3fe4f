//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the Nowbar per-user data directory.
///
/// Resolves to the platform application-data location (e.g.
/// `~/.local/share/nowbar` on Linux, `~/Library/Application Support/nowbar`
/// on macOS).
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine user data directory".to_string())
    })?;
    Ok(base.join("nowbar"))
}

/// Get the settings document path (`<data-dir>/storage.json`).
pub fn storage_file() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("storage.json"))
}
