//! HTTP boundary of the inklet client engine.
//!
//! [`SessionContext`] holds the live session and owns the single token
//! refresh primitive; [`ApiGateway`] wraps every outbound call with bearer
//! injection and a bounded refresh-retry; the `*Api` types are thin typed
//! wrappers over the server's endpoints.

pub mod auth_api;
pub mod diff_api;
pub mod documents_api;
pub mod gateway;
pub mod session_context;
pub mod versions_api;

pub use auth_api::{AuthApi, LoginRequest, ProfileUpdate, RegisterRequest, TokenResponse};
pub use diff_api::{DiffApi, DiffMode, DiffOptions, DiffResponse};
pub use documents_api::{DocumentCreate, DocumentListParams, DocumentUpdate, DocumentsApi};
pub use gateway::ApiGateway;
pub use session_context::SessionContext;
pub use versions_api::{VersionCreate, VersionListParams, VersionsApi};
