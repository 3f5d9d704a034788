//! Request gateway.
//!
//! Every outbound call is tagged with the current access token. A 401 on a
//! not-yet-retried request triggers the session's single-flight refresh and
//! exactly one re-issue with the new token; a second 401 surfaces to the
//! caller unchanged. Requests are rebuilt from scratch per attempt, so there
//! is no body-cloning involved in the retry.

use crate::session_context::SessionContext;
use inklet_core::{InkletError, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP boundary for all authenticated API traffic.
pub struct ApiGateway {
    http: Client,
    base_url: String,
    session: SessionContext,
}

impl ApiGateway {
    /// Creates a gateway talking to the given API base URL.
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            session,
        }
    }

    /// The session context this gateway authenticates with.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    // ============================================================================
    // Typed round-trips
    // ============================================================================

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .execute(Method::GET, path, query, None::<&()>, true)
            .await?;
        Self::decode(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::POST, path, &[], body, true).await?;
        Self::decode(response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::PUT, path, &[], body, true).await?;
        Self::decode(response).await
    }

    /// POST whose response body is irrelevant (logout, password change).
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        self.execute(Method::POST, path, &[], body, true).await?;
        Ok(())
    }

    /// DELETE whose response body is irrelevant.
    pub async fn delete_empty(&self, path: &str) -> Result<()> {
        self.execute(Method::DELETE, path, &[], None::<&()>, true)
            .await?;
        Ok(())
    }

    /// Unauthenticated POST with no refresh-retry, for login and register.
    ///
    /// A 401 here means bad credentials, not an expired token, so the
    /// refresh machinery must stay out of the way.
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(Method::POST, path, &[], Some(body), false)
            .await?;
        Self::decode(response).await
    }

    // ============================================================================
    // Core send loop
    // ============================================================================

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        auth: bool,
    ) -> Result<Response> {
        let mut retried = false;
        loop {
            let mut request = self
                .http
                .request(method.clone(), format!("{}{}", self.base_url, path));
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            if auth {
                if let Some(token) = self.session.access_token() {
                    request = request.bearer_auth(token);
                }
            }

            let response = request
                .send()
                .await
                .map_err(|err| InkletError::network(format!("request to {path} failed: {err}")))?;

            if auth && response.status() == StatusCode::UNAUTHORIZED && !retried {
                // Exactly one refresh-and-retry per failing request. The
                // refresh itself is single-flight across requests; a dead
                // refresh token surfaces as SessionExpired here.
                retried = true;
                tracing::debug!(path, "authorization rejected, refreshing token");
                self.session.refresh().await?;
                continue;
            }

            return Self::check_status(path, response).await;
        }
    }

    async fn check_status(path: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = Self::error_detail(response).await;
        let err = match status {
            StatusCode::UNAUTHORIZED => InkletError::unauthorized(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                InkletError::validation(message)
            }
            _ => InkletError::Http {
                status: status.as_u16(),
                message,
            },
        };
        tracing::error!(path, status = status.as_u16(), "API error: {err}");
        Err(err)
    }

    /// Extracts the server's error detail; falls back to the raw body.
    async fn error_detail(response: Response) -> String {
        #[derive(Deserialize)]
        struct ErrorBody {
            detail: String,
        }

        let body = response.text().await.unwrap_or_default();
        serde_json::from_str::<ErrorBody>(&body)
            .map(|parsed| parsed.detail)
            .unwrap_or(body)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json().await.map_err(|err| InkletError::Serialization {
            format: "JSON".to_string(),
            message: format!("failed to parse response body: {err}"),
        })
    }
}

/// Narrows a generic 404 to a typed NotFound for a known entity.
pub(crate) fn specialize_not_found(
    err: InkletError,
    entity_type: &'static str,
    id: &str,
) -> InkletError {
    match err {
        InkletError::Http { status: 404, .. } => InkletError::not_found(entity_type, id),
        other => other,
    }
}
