//! Document and version domain models.
//!
//! Versions are immutable, server-numbered snapshots: the server assigns
//! `version_number` (strictly increasing per document) and every id. The
//! client never fabricates either; "restoring" an old version appends a new
//! one rather than rewriting history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Document metadata as held by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_version_number: u64,
}

/// Classification of a persisted version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SaveType {
    #[default]
    Manual,
    Auto,
    Draft,
}

impl SaveType {
    /// Commit message used when the caller supplies none.
    pub fn default_commit_message(&self) -> &'static str {
        match self {
            SaveType::Auto => "Auto-saved version",
            _ => "Saved version",
        }
    }
}

/// A full, immutable snapshot of a document's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    pub document_id: String,
    pub version_number: u64,
    pub content: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    pub save_type: SaveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version_id: Option<String>,
}

/// A version-list entry; carries metadata but not the content body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionListItem {
    pub id: String,
    pub version_number: u64,
    pub created_at: DateTime<Utc>,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    pub save_type: SaveType,
    pub content_length: u64,
}
