//! Session lifecycle manager.
//!
//! `SessionManager` orchestrates login, registration, logout, session
//! restoration, and profile mutation on top of the shared
//! [`SessionContext`]. Public operations return a success flag and never
//! propagate network failures; the human-readable reason lands in
//! [`last_error`](SessionManager::last_error) instead.
//!
//! Session state moves `Anonymous -> Authenticated -> Anonymous`; a token
//! refresh happens inside `Authenticated` and is never observable as a drop
//! to anonymous while it succeeds.

use async_trait::async_trait;
use inklet_client::{
    ApiGateway, AuthApi, LoginRequest, ProfileUpdate, RegisterRequest, SessionContext,
};
use inklet_core::{InkletError, SessionAuthority, SessionStatus, User};
use std::sync::{Arc, RwLock};

/// Owner of the session lifecycle.
pub struct SessionManager {
    session: SessionContext,
    auth_api: AuthApi,
    error: RwLock<Option<String>>,
}

impl SessionManager {
    /// Creates a manager driving the given gateway's session.
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            session: gateway.session().clone(),
            auth_api: AuthApi::new(gateway),
            error: RwLock::new(None),
        }
    }

    // ============================================================================
    // Authentication
    // ============================================================================

    /// Exchanges credentials for a session.
    ///
    /// On success the token pair and user are installed atomically, in
    /// memory and in the credential store. A 401 is reported as bad
    /// credentials; anything else carries the underlying error message.
    pub async fn login(&self, credentials: LoginRequest) -> bool {
        self.set_error(None);
        match self.auth_api.login(&credentials).await {
            Ok(tokens) => {
                self.session.install(tokens);
                true
            }
            Err(err) => {
                tracing::error!("login failed: {err}");
                let message = if err.is_unauthorized() {
                    "Invalid username or password".to_string()
                } else {
                    err.to_string()
                };
                self.set_error(Some(message));
                false
            }
        }
    }

    /// Registers a new account and installs the issued session.
    pub async fn register(&self, data: RegisterRequest) -> bool {
        self.set_error(None);
        match self.auth_api.register(&data).await {
            Ok(tokens) => {
                self.session.install(tokens);
                true
            }
            Err(err) => {
                tracing::error!("registration failed: {err}");
                self.set_error(Some(err.to_string()));
                false
            }
        }
    }

    /// Ends the session.
    ///
    /// Server-side invalidation is best-effort; the local session is
    /// cleared no matter what, so logout always succeeds locally.
    pub async fn logout(&self) {
        if self.session.access_token().is_some() {
            if let Err(err) = self.auth_api.logout().await {
                tracing::warn!("server-side logout failed: {err}");
            }
        }
        self.session.clear();
        self.set_error(None);
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Delegates to the session's single refresh primitive; a failure has
    /// already cleared the session by the time this returns.
    pub async fn refresh_access_token(&self) -> bool {
        match self.session.refresh().await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("token refresh failed: {err}");
                false
            }
        }
    }

    /// Fetches the current user's profile and caches it.
    ///
    /// Rides the gateway, so an expired access token is refreshed once and
    /// the fetch retried once; a 401 that survives that is a failure, not a
    /// loop.
    pub async fn fetch_current_user(&self) -> bool {
        if self.session.access_token().is_none() {
            return false;
        }
        match self.auth_api.me().await {
            Ok(user) => {
                self.session.set_user(user);
                true
            }
            Err(err) => {
                tracing::error!("failed to fetch current user: {err}");
                false
            }
        }
    }

    /// Restores a persisted session after a reload.
    ///
    /// Two phases: the persisted credentials are adopted optimistically,
    /// then validated against the server. Validation failure rolls the
    /// whole session back to anonymous.
    pub async fn restore_session(&self) -> bool {
        match self.session.restore_persisted() {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                tracing::error!("failed to read persisted session: {err}");
                return false;
            }
        }

        if self.fetch_current_user().await {
            true
        } else {
            self.session.clear();
            false
        }
    }

    // ============================================================================
    // Profile mutation
    // ============================================================================

    /// Updates the current user's profile.
    pub async fn update_profile(&self, patch: ProfileUpdate) -> bool {
        self.set_error(None);
        match self.auth_api.update_me(&patch).await {
            Ok(user) => {
                self.session.set_user(user);
                true
            }
            Err(err) => {
                tracing::error!("profile update failed: {err}");
                self.set_error(Some(err.to_string()));
                false
            }
        }
    }

    /// Changes the password.
    ///
    /// Success clears the local session on purpose: the old tokens
    /// authenticate a credential that no longer exists, so the user must
    /// log in again. A wrong old password surfaces as a message and leaves
    /// the session untouched.
    pub async fn update_password(&self, old_password: &str, new_password: &str) -> bool {
        self.set_error(None);
        match self
            .auth_api
            .change_password(old_password, new_password)
            .await
        {
            Ok(()) => {
                self.session.clear();
                true
            }
            Err(err) => {
                let message = match &err {
                    InkletError::Validation(detail) => detail.clone(),
                    other => other.to_string(),
                };
                tracing::error!("password change failed: {err}");
                self.set_error(Some(message));
                false
            }
        }
    }

    // ============================================================================
    // Observable state
    // ============================================================================

    /// Derived: access token and user are both present.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.snapshot().is_admin()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// The message of the last failed operation, if any.
    pub fn last_error(&self) -> Option<String> {
        self.error.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    fn set_error(&self, message: Option<String>) {
        *self.error.write().unwrap() = message;
    }
}

#[async_trait]
impl SessionAuthority for SessionManager {
    fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    async fn restore_session(&self) -> bool {
        SessionManager::restore_session(self).await
    }
}
