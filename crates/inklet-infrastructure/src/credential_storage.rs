//! Durable credential persistence.
//!
//! The token store of the engine: access token, refresh token, and the
//! cached user profile are written as one record so a page reload can never
//! observe a token without its user. The session side is the only writer.

use crate::paths::InkletPaths;
use crate::storage::AtomicJsonFile;
use inklet_core::{Result, SessionSnapshot};
use std::path::PathBuf;

/// File-backed storage for the persisted session credentials.
pub struct CredentialStorage {
    file: AtomicJsonFile<SessionSnapshot>,
}

impl CredentialStorage {
    /// Creates storage backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    /// Creates storage at the default location
    /// (`<config dir>/inklet/credentials.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be
    /// determined.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(InkletPaths::credentials_file()?))
    }

    /// Loads the persisted credentials.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(snapshot))`: Credentials are present on disk
    /// - `Ok(None)`: Nothing persisted (or the file is empty)
    /// - `Err(_)`: The file exists but cannot be read or parsed
    pub fn load(&self) -> Result<Option<SessionSnapshot>> {
        self.file.load()
    }

    /// Persists the given credentials atomically.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.file.save(snapshot)
    }

    /// Removes every persisted credential at once.
    pub fn clear(&self) -> Result<()> {
        self.file.remove()
    }
}
