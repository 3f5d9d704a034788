//! Durable user settings persistence.
//!
//! Holds the save policy and the theme preference. Writers here are the
//! document/view side; the key set is disjoint from the credential store,
//! so the two never contend.

use crate::paths::InkletPaths;
use crate::storage::AtomicJsonFile;
use inklet_core::{Result, SaveSettings, ThemeMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The on-disk shape of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    save_settings: Option<SaveSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<ThemeMode>,
}

/// File-backed storage for user-scoped settings.
pub struct SettingsStorage {
    file: AtomicJsonFile<PersistedSettings>,
}

impl SettingsStorage {
    /// Creates storage backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    /// Creates storage at the default location
    /// (`<config dir>/inklet/settings.json`).
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(InkletPaths::settings_file()?))
    }

    /// Loads the persisted save settings, if any.
    pub fn load_save_settings(&self) -> Result<Option<SaveSettings>> {
        Ok(self.file.load()?.and_then(|s| s.save_settings))
    }

    /// Persists the save settings, preserving the theme key.
    pub fn save_save_settings(&self, settings: &SaveSettings) -> Result<()> {
        self.file.update(PersistedSettings::default(), |persisted| {
            persisted.save_settings = Some(settings.clone());
            Ok(())
        })
    }

    /// Loads the persisted theme, if any.
    pub fn load_theme(&self) -> Result<Option<ThemeMode>> {
        Ok(self.file.load()?.and_then(|s| s.theme))
    }

    /// Persists the theme, preserving the save settings key.
    pub fn save_theme(&self, theme: ThemeMode) -> Result<()> {
        self.file.update(PersistedSettings::default(), |persisted| {
            persisted.theme = Some(theme);
            Ok(())
        })
    }
}
