//! Auth endpoint wrappers.

use crate::gateway::ApiGateway;
use inklet_core::{Result, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Typed access to the `/auth` endpoints.
pub struct AuthApi {
    gateway: Arc<ApiGateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Registers a new account. Unauthenticated; no refresh-retry.
    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse> {
        self.gateway.post_public("/auth/register", request).await
    }

    /// Exchanges credentials for a token pair. Unauthenticated; a 401 here
    /// means the credentials are wrong.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse> {
        self.gateway.post_public("/auth/login", credentials).await
    }

    /// Fetches the profile of the authenticated user.
    pub async fn me(&self) -> Result<User> {
        self.gateway.get("/auth/me", &[]).await
    }

    /// Updates the authenticated user's profile.
    pub async fn update_me(&self, patch: &ProfileUpdate) -> Result<User> {
        self.gateway.put("/auth/me", Some(patch)).await
    }

    /// Changes the password. The server answers 400 on a wrong old password.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        self.gateway
            .post_empty(
                "/auth/me/password",
                Some(&PasswordChangeRequest {
                    old_password,
                    new_password,
                }),
            )
            .await
    }

    /// Invalidates the session server-side.
    pub async fn logout(&self) -> Result<()> {
        self.gateway.post_empty("/auth/logout", None::<&()>).await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub verification_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Token pair plus the user it belongs to, as issued by login/register.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds. Informational: re-authentication
    /// is reactive (401-driven), not scheduled.
    pub expires_in: u64,
    pub user: User,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Serialize)]
struct PasswordChangeRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}
