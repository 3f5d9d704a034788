//! Consumer-facing authentication interface.

use async_trait::async_trait;

/// The interface a route guard consumes to gate navigation.
///
/// Implementations answer two questions: is the user authenticated right
/// now, and can a persisted session be brought back after a reload. A guard
/// that finds neither should redirect to the login view, preserving the
/// originally requested path for the post-login redirect.
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    /// Whether a usable session is currently installed.
    fn is_authenticated(&self) -> bool;

    /// Attempts to restore a persisted session.
    ///
    /// Returns `true` when the session was restored and validated against
    /// the server. Any failure leaves the caller unauthenticated; this never
    /// errors because the guard only needs the yes/no answer.
    async fn restore_session(&self) -> bool;
}
