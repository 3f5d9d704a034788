//! Unified path management for inklet client-side state.
//!
//! Credentials and settings live under one per-user configuration
//! directory so the storage layer never scatters files across the system.
//!
//! ```text
//! ~/.config/inklet/            # Config directory (platform-dependent)
//! ├── credentials.json         # Token pair + cached user profile
//! └── settings.json            # Save policy + theme
//! ```

use inklet_core::{InkletError, Result};
use std::path::PathBuf;

/// Unified path management for inklet.
pub struct InkletPaths;

impl InkletPaths {
    /// Returns the inklet configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to the config directory (e.g. `~/.config/inklet/`)
    /// - `Err(_)`: The platform config directory could not be determined
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("inklet"))
            .ok_or_else(|| InkletError::storage("Cannot determine config directory"))
    }

    /// Returns the path to the persisted credentials file.
    pub fn credentials_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("credentials.json"))
    }

    /// Returns the path to the persisted settings file.
    pub fn settings_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }
}
