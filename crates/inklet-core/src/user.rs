//! User profile domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user profile as returned by the auth endpoints.
///
/// All fields are server-assigned; the client only caches this record
/// alongside the token pair so a reload can repopulate the session without
/// an extra round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}
