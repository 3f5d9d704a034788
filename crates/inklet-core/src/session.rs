//! In-memory session state.
//!
//! `SessionSnapshot` is the single source of truth for "who is logged in":
//! the token pair plus the cached user profile. `is_authenticated` is derived
//! from it on every read rather than stored, so the session can never drift
//! into a half-authenticated state. Install and clear replace the whole
//! snapshot at once for the same reason.

use crate::user::User;
use serde::{Deserialize, Serialize};

/// The complete authentication state of the client.
///
/// This struct doubles as the persisted credential record: it is written to
/// durable storage as one unit, so a page reload can never observe a token
/// without its user or vice versa.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Coarse session phase derived from the snapshot.
///
/// A refresh in flight is not a phase of its own: the old access token stays
/// installed until the replacement arrives, so a successful refresh is never
/// observable as a drop to `Anonymous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
}

impl SessionSnapshot {
    /// Builds a fully authenticated snapshot.
    pub fn authenticated(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: User,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            user: Some(user),
        }
    }

    /// Drops every credential at once.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when both an access token and a user profile are present.
    ///
    /// Derived on every call; never cached.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.user.is_some()
    }

    /// True when the current user has superuser rights.
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_superuser)
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }
}
