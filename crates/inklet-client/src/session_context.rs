//! Authenticated session context.
//!
//! `SessionContext` owns the in-memory [`SessionSnapshot`], mirrors every
//! change into the credential store, and provides the one and only token
//! refresh implementation. The request gateway and the session manager both
//! await [`SessionContext::refresh`]; neither re-implements the exchange.
//!
//! Refreshes are single-flight: the first caller builds the refresh future
//! and parks it as the pending operation; callers arriving while it is in
//! flight await the same future, so N concurrent authorization failures
//! produce exactly one network call and every waiter resumes with the same
//! outcome.

use crate::auth_api::TokenResponse;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use inklet_core::{InkletError, Result, SessionSnapshot, SessionStatus, User};
use inklet_infrastructure::CredentialStorage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

type RefreshFuture = Shared<BoxFuture<'static, Result<String>>>;

/// Shared session state and the unified refresh primitive.
///
/// Cheap to clone; every clone sees the same session. Constructed once at
/// application start and handed to the gateway and the session manager.
/// All credential-store writes go through here.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: Client,
    base_url: String,
    state: RwLock<SessionSnapshot>,
    storage: CredentialStorage,
    /// The in-flight refresh, if any. Taken by the first failing caller,
    /// observed by everyone who fails while it runs.
    pending_refresh: Mutex<Option<RefreshFuture>>,
}

impl SessionContext {
    /// Creates a context talking to the given API base URL.
    pub fn new(base_url: impl Into<String>, storage: CredentialStorage) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(SessionInner {
                http: Client::new(),
                base_url,
                state: RwLock::new(SessionSnapshot::default()),
                storage,
                pending_refresh: Mutex::new(None),
            }),
        }
    }

    // ============================================================================
    // Snapshot access
    // ============================================================================

    /// The current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.inner.state.read().unwrap().access_token.clone()
    }

    /// The current user profile, if any.
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.read().unwrap().user.clone()
    }

    /// Derived: access token and user are both present.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().unwrap().is_authenticated()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.state.read().unwrap().status()
    }

    /// A copy of the full session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.read().unwrap().clone()
    }

    // ============================================================================
    // Session mutation (the only writers of the credential store)
    // ============================================================================

    /// Atomically installs a freshly issued token pair and user.
    ///
    /// Memory is the source of truth; a persistence failure is logged and
    /// does not undo the login.
    pub fn install(&self, tokens: TokenResponse) {
        let snapshot =
            SessionSnapshot::authenticated(tokens.access_token, tokens.refresh_token, tokens.user);
        *self.inner.state.write().unwrap() = snapshot.clone();
        if let Err(err) = self.inner.storage.save(&snapshot) {
            tracing::error!("failed to persist credentials: {err}");
        }
    }

    /// Replaces the cached user profile, keeping the token pair.
    pub fn set_user(&self, user: User) {
        let snapshot = {
            let mut state = self.inner.state.write().unwrap();
            state.user = Some(user);
            state.clone()
        };
        if let Err(err) = self.inner.storage.save(&snapshot) {
            tracing::error!("failed to persist user profile: {err}");
        }
    }

    /// Drops the entire session, in memory and on disk.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Optimistically adopts persisted credentials, if a complete record
    /// exists.
    ///
    /// Both the access token and the cached user must be present; a partial
    /// record is treated as no session. The caller is expected to validate
    /// the adopted session against the server and call [`clear`] if that
    /// fails.
    ///
    /// [`clear`]: SessionContext::clear
    pub fn restore_persisted(&self) -> Result<bool> {
        let Some(snapshot) = self.inner.storage.load()? else {
            return Ok(false);
        };
        if snapshot.access_token.is_none() || snapshot.user.is_none() {
            return Ok(false);
        }

        *self.inner.state.write().unwrap() = snapshot;
        Ok(true)
    }

    // ============================================================================
    // Token refresh
    // ============================================================================

    /// Exchanges the refresh token for a new access token, single-flight.
    ///
    /// # Returns
    ///
    /// The new access token. Every caller that awaited the same in-flight
    /// refresh receives the same result.
    ///
    /// # Errors
    ///
    /// - `SessionExpired` when no refresh token exists (nothing is cleared;
    ///   there was no session worth keeping) or when the exchange fails
    ///   (the whole session is cleared first — a dead refresh token is
    ///   terminal and is not retried).
    pub async fn refresh(&self) -> Result<String> {
        let fut = {
            let mut pending = self.inner.pending_refresh.lock().await;
            match pending.as_ref() {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let fut: RefreshFuture =
                        async move { inner.perform_refresh().await }.boxed().shared();
                    *pending = Some(fut.clone());
                    fut
                }
            }
        };

        let result = fut.clone().await;

        // Retire the completed operation so a later expiry starts a fresh
        // one. Only the future we actually awaited is removed; a newer
        // refresh that raced in stays put.
        let mut pending = self.inner.pending_refresh.lock().await;
        if pending.as_ref().is_some_and(|current| current.ptr_eq(&fut)) {
            *pending = None;
        }

        result
    }
}

impl SessionInner {
    fn clear(&self) {
        self.state.write().unwrap().clear();
        if let Err(err) = self.storage.clear() {
            tracing::error!("failed to clear persisted credentials: {err}");
        }
    }

    async fn perform_refresh(&self) -> Result<String> {
        let refresh_token = self.state.read().unwrap().refresh_token.clone();
        let Some(refresh_token) = refresh_token else {
            return Err(InkletError::SessionExpired);
        };

        match self.exchange_refresh_token(refresh_token).await {
            Ok(refreshed) => {
                let access_token = refreshed.access_token.clone();
                self.adopt_refreshed(refreshed);
                tracing::debug!("access token refreshed");
                Ok(access_token)
            }
            Err(err) => {
                // The refresh token is assumed invalid or expired; terminal.
                tracing::warn!("token refresh failed, clearing session: {err}");
                self.clear();
                Err(InkletError::SessionExpired)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: String) -> Result<RefreshedTokens> {
        let response = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|err| InkletError::network(format!("token refresh request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InkletError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|err| {
            InkletError::network(format!("failed to parse refresh response: {err}"))
        })
    }

    fn adopt_refreshed(&self, refreshed: RefreshedTokens) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            state.access_token = Some(refreshed.access_token);
            // Servers may rotate the refresh token alongside the access token.
            if let Some(rotated) = refreshed.refresh_token {
                state.refresh_token = Some(rotated);
            }
            state.clone()
        };
        if let Err(err) = self.storage.save(&snapshot) {
            tracing::error!("failed to persist refreshed tokens: {err}");
        }
    }
}

#[derive(Serialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Deserialize)]
struct RefreshedTokens {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}
