//! Error types for the inklet client engine.

use thiserror::Error;

/// A shared error type for the entire inklet client engine.
///
/// Variants follow the failure taxonomy of the engine: a fresh authorization
/// rejection is distinct from a dead refresh token, a validation complaint is
/// distinct from a transport fault, and a server-side data inconsistency is
/// never silently recovered.
///
/// The type is `Clone` because the outcome of a single-flight token refresh
/// is broadcast to every caller that awaited it.
#[derive(Error, Debug, Clone)]
pub enum InkletError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Authorization failure on a fresh request (HTTP 401)
    #[error("Authentication rejected: {0}")]
    Unauthorized(String),

    /// The refresh token itself was rejected. Terminal for the session;
    /// the caller should route the user back to login.
    #[error("Session expired: re-authentication required")]
    SessionExpired,

    /// Request rejected by server-side validation (HTTP 400-class)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Any other non-success HTTP response
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure (connect, timeout, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// Server data violates an invariant the client relies on
    #[error("Data consistency error: {0}")]
    Consistency(String),

    /// A save round-trip is already in flight for the current document
    #[error("A save is already in progress")]
    SaveInProgress,

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Durable storage error (locking, paths)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InkletError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a Consistency error
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a fresh authorization rejection (HTTP 401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Check if the session is terminally expired
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a consistency error
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }

    /// Check if this error should route the user to the login view.
    ///
    /// True for a dead refresh token; a plain `Unauthorized` is not terminal
    /// by itself because the request gateway may still refresh and retry.
    pub fn requires_login(&self) -> bool {
        self.is_session_expired()
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for InkletError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for InkletError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, InkletError>`.
pub type Result<T> = std::result::Result<T, InkletError>;
