//! Save policy and save state.
//!
//! `SaveSettings` is the durable, user-scoped policy (how saving should
//! behave); `SaveState` is the ephemeral per-editing-session record (what is
//! happening right now). Auto-save eligibility is a pure function over both,
//! recomputed on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// How saving is driven for this user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SaveMode {
    /// Only explicit user saves create versions.
    Manual,
    /// Only the auto-save timer creates versions.
    Auto,
    /// Both explicit saves and the timer create versions.
    Hybrid,
}

/// Durable save policy, independent of any document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSettings {
    pub save_mode: SaveMode,
    /// Auto-save cadence, in seconds.
    pub auto_save_interval: u32,
    pub confirm_before_save: bool,
    pub warn_before_leave: bool,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            save_mode: SaveMode::Hybrid,
            auto_save_interval: 30,
            confirm_before_save: false,
            warn_before_leave: true,
        }
    }
}

impl SaveSettings {
    /// Merge-patch update: fields left `None` keep their prior value.
    pub fn apply(&mut self, patch: &SaveSettingsPatch) {
        if let Some(save_mode) = patch.save_mode {
            self.save_mode = save_mode;
        }
        if let Some(interval) = patch.auto_save_interval {
            self.auto_save_interval = interval;
        }
        if let Some(confirm) = patch.confirm_before_save {
            self.confirm_before_save = confirm;
        }
        if let Some(warn) = patch.warn_before_leave {
            self.warn_before_leave = warn;
        }
    }

    /// The configured cadence converted to milliseconds, as consumed by
    /// [`SaveState::auto_save_interval`].
    pub fn auto_save_interval_ms(&self) -> u64 {
        u64::from(self.auto_save_interval) * 1000
    }
}

/// Partial update for [`SaveSettings`]; unspecified fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_mode: Option<SaveMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_before_save: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn_before_leave: Option<bool>,
}

/// Ephemeral state of the active editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveState {
    /// Editor buffer differs from the last loaded/saved version's content.
    pub is_dirty: bool,
    /// A save round-trip is in flight. At most one per document.
    pub is_saving: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub auto_save_enabled: bool,
    /// Auto-save cadence, in milliseconds.
    pub auto_save_interval: u64,
}

impl Default for SaveState {
    fn default() -> Self {
        Self {
            is_dirty: false,
            is_saving: false,
            last_saved: None,
            auto_save_enabled: true,
            auto_save_interval: 30_000,
        }
    }
}

/// Whether the auto-save timer should fire at all.
///
/// The timer itself lives in the view layer; this only answers the policy
/// question.
pub fn auto_save_eligible(settings: &SaveSettings, state: &SaveState) -> bool {
    settings.save_mode != SaveMode::Manual && state.auto_save_enabled
}
