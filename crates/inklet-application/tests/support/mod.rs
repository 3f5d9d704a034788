//! In-process stub of the inklet backend for application-level tests.
//!
//! Implements just enough of the auth and version-history protocol to
//! exercise the session manager and the document workspace end to end:
//! bearer-checked routes, token refresh, and an append-only in-memory
//! version store with server-assigned numbers.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use inklet_client::{ApiGateway, SessionContext};
use inklet_core::{Document, SaveType, User, Version, VersionListItem};
use inklet_infrastructure::CredentialStorage;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const PASSWORD: &str = "secret";

pub fn test_user(username: &str) -> User {
    User {
        id: "u-1".to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: None,
        avatar_url: None,
        is_active: true,
        is_superuser: false,
        timezone: "UTC".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        last_login_at: None,
    }
}

struct DocumentRecord {
    document: Document,
    versions: Vec<Version>,
}

#[derive(Clone)]
pub struct StubBackend {
    /// The access token the stub currently accepts.
    pub valid_token: Arc<Mutex<String>>,
    pub refresh_ok: Arc<AtomicBool>,
    pub refresh_calls: Arc<AtomicUsize>,
    pub logout_fails: Arc<AtomicBool>,
    pub create_calls: Arc<AtomicUsize>,
    pub slow_save: Arc<AtomicBool>,
    pub fail_save: Arc<AtomicBool>,
    documents: Arc<Mutex<HashMap<String, DocumentRecord>>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            valid_token: Arc::new(Mutex::new("<none>".to_string())),
            refresh_ok: Arc::new(AtomicBool::new(true)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            logout_fails: Arc::new(AtomicBool::new(false)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            slow_save: Arc::new(AtomicBool::new(false)),
            fail_save: Arc::new(AtomicBool::new(false)),
            documents: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a document whose history contains one version per entry of
    /// `contents`, numbered from 1.
    pub fn seed_document(&self, id: &str, title: &str, contents: &[&str]) {
        let now = Utc::now();
        let versions: Vec<Version> = contents
            .iter()
            .enumerate()
            .map(|(index, content)| {
                let number = index as u64 + 1;
                Version {
                    id: uuid::Uuid::new_v4().to_string(),
                    document_id: id.to_string(),
                    version_number: number,
                    content: content.to_string(),
                    content_hash: format!("hash-{number}"),
                    created_at: now,
                    author: "ada".to_string(),
                    commit_message: Some("Saved version".to_string()),
                    save_type: SaveType::Manual,
                    parent_version_id: None,
                }
            })
            .collect();

        let record = DocumentRecord {
            document: Document {
                id: id.to_string(),
                title: title.to_string(),
                created_at: now,
                updated_at: now,
                current_version_number: versions.len() as u64,
            },
            versions,
        };
        self.documents.lock().unwrap().insert(id.to_string(), record);
    }

    /// The version ids of a document's history, oldest first.
    pub fn version_ids(&self, document_id: &str) -> Vec<String> {
        self.documents.lock().unwrap()[document_id]
            .versions
            .iter()
            .map(|version| version.id.clone())
            .collect()
    }

    /// The stored content of a version, for immutability assertions.
    pub fn version_content(&self, document_id: &str, version_id: &str) -> String {
        self.documents.lock().unwrap()[document_id]
            .versions
            .iter()
            .find(|version| version.id == version_id)
            .map(|version| version.content.clone())
            .unwrap()
    }

    /// Simulates access-token expiry: the server stops accepting the token
    /// it previously issued, but the refresh token stays valid.
    pub fn expire_access_token(&self) {
        *self.valid_token.lock().unwrap() = "<rotated>".to_string();
    }

    pub fn refresh_call_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/me", get(me).put(update_me))
            .route("/auth/me/password", post(change_password))
            .route("/auth/logout", post(logout))
            .route("/documents/{id}", get(get_document))
            .route(
                "/documents/{id}/versions",
                get(list_versions).post(create_version),
            )
            .route("/documents/{id}/versions/{version_id}", get(get_version))
            .route(
                "/documents/{id}/versions/number/{number}",
                get(get_version_by_number),
            )
            .route("/documents/{id}/restore/{version_id}", post(restore_version))
            .with_state(self.clone())
    }
}

/// Binds the stub on an ephemeral port and serves it in the background.
pub async fn spawn(backend: &StubBackend) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = backend.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Builds a gateway whose credential store lives under the given temp dir.
pub fn build_gateway(base_url: &str, dir: &TempDir) -> Arc<ApiGateway> {
    let storage = CredentialStorage::new(dir.path().join("credentials.json"));
    let context = SessionContext::new(base_url, storage);
    Arc::new(ApiGateway::new(base_url, context))
}

// ============================================================================
// Handlers
// ============================================================================

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Not authenticated" })),
    )
        .into_response()
}

fn authorize(state: &StubBackend, headers: &HeaderMap) -> Result<(), Response> {
    let valid = state.valid_token.lock().unwrap().clone();
    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if provided == Some(valid.as_str()) {
        Ok(())
    } else {
        Err(unauthorized())
    }
}

fn token_response(username: &str) -> serde_json::Value {
    json!({
        "access_token": "acc-1",
        "refresh_token": "ref-1",
        "token_type": "bearer",
        "expires_in": 1800,
        "user": test_user(username),
    })
}

async fn register(
    State(state): State<StubBackend>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let username = body["username"].as_str().unwrap_or("ada").to_string();
    *state.valid_token.lock().unwrap() = "acc-1".to_string();
    Json(token_response(&username)).into_response()
}

async fn login(
    State(state): State<StubBackend>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if body["password"].as_str() == Some(PASSWORD) {
        let username = body["username"].as_str().unwrap_or("ada").to_string();
        *state.valid_token.lock().unwrap() = "acc-1".to_string();
        Json(token_response(&username)).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid credentials" })),
        )
            .into_response()
    }
}

async fn refresh(
    State(state): State<StubBackend>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let calls = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

    if body["refresh_token"].as_str().is_none() || !state.refresh_ok.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid refresh token" })),
        )
            .into_response();
    }

    let new_token = format!("refreshed-{calls}");
    *state.valid_token.lock().unwrap() = new_token.clone();
    Json(json!({ "access_token": new_token })).into_response()
}

async fn me(State(state): State<StubBackend>, headers: HeaderMap) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    Json(test_user("ada")).into_response()
}

async fn update_me(
    State(state): State<StubBackend>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    let mut user = test_user("ada");
    if let Some(full_name) = body["full_name"].as_str() {
        user.full_name = Some(full_name.to_string());
    }
    Json(user).into_response()
}

async fn change_password(
    State(state): State<StubBackend>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    if body["old_password"].as_str() == Some(PASSWORD) {
        Json(json!({})).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Old password is incorrect" })),
        )
            .into_response()
    }
}

async fn logout(State(state): State<StubBackend>, headers: HeaderMap) -> Response {
    if state.logout_fails.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "logout backend down" })),
        )
            .into_response();
    }
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    Json(json!({})).into_response()
}

async fn get_document(
    State(state): State<StubBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    let documents = state.documents.lock().unwrap();
    match documents.get(&id) {
        Some(record) => Json(record.document.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Document not found" })),
        )
            .into_response(),
    }
}

async fn list_versions(
    State(state): State<StubBackend>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    let documents = state.documents.lock().unwrap();
    let Some(record) = documents.get(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Document not found" })),
        )
            .into_response();
    };

    let save_type = params
        .get("save_type")
        .and_then(|value| SaveType::from_str(value).ok());
    let limit = params
        .get("limit")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(100);

    let items: Vec<VersionListItem> = record
        .versions
        .iter()
        .rev()
        .filter(|version| save_type.is_none_or(|wanted| version.save_type == wanted))
        .take(limit)
        .map(|version| VersionListItem {
            id: version.id.clone(),
            version_number: version.version_number,
            created_at: version.created_at,
            author: version.author.clone(),
            commit_message: version.commit_message.clone(),
            save_type: version.save_type,
            content_length: version.content.len() as u64,
        })
        .collect();
    Json(items).into_response()
}

#[derive(Deserialize)]
struct CreateVersionBody {
    content: String,
    #[serde(default)]
    commit_message: Option<String>,
    #[serde(default)]
    save_type: Option<SaveType>,
    #[serde(default)]
    author: Option<String>,
}

async fn create_version(
    State(state): State<StubBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateVersionBody>,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    if state.fail_save.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "version store unavailable" })),
        )
            .into_response();
    }
    if state.slow_save.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let mut documents = state.documents.lock().unwrap();
    let Some(record) = documents.get_mut(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Document not found" })),
        )
            .into_response();
    };

    let parent = record.versions.last();
    let number = parent.map(|version| version.version_number).unwrap_or(0) + 1;
    let version = Version {
        id: uuid::Uuid::new_v4().to_string(),
        document_id: id.clone(),
        version_number: number,
        content: body.content,
        content_hash: format!("hash-{number}"),
        created_at: Utc::now(),
        author: body.author.unwrap_or_else(|| "anonymous".to_string()),
        commit_message: body.commit_message,
        save_type: body.save_type.unwrap_or_default(),
        parent_version_id: parent.map(|version| version.id.clone()),
    };
    record.versions.push(version.clone());
    record.document.current_version_number = number;
    state.create_calls.fetch_add(1, Ordering::SeqCst);

    Json(version).into_response()
}

async fn get_version(
    State(state): State<StubBackend>,
    Path((id, version_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    let documents = state.documents.lock().unwrap();
    let version = documents
        .get(&id)
        .and_then(|record| {
            record
                .versions
                .iter()
                .find(|version| version.id == version_id)
        })
        .cloned();
    match version {
        Some(version) => Json(version).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Version not found" })),
        )
            .into_response(),
    }
}

async fn get_version_by_number(
    State(state): State<StubBackend>,
    Path((id, number)): Path<(String, u64)>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    let documents = state.documents.lock().unwrap();
    let version = documents
        .get(&id)
        .and_then(|record| {
            record
                .versions
                .iter()
                .find(|version| version.version_number == number)
        })
        .cloned();
    match version {
        Some(version) => Json(version).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Version not found" })),
        )
            .into_response(),
    }
}

async fn restore_version(
    State(state): State<StubBackend>,
    Path((id, version_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err;
    }
    let mut documents = state.documents.lock().unwrap();
    let Some(record) = documents.get_mut(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Document not found" })),
        )
            .into_response();
    };
    let Some(target) = record
        .versions
        .iter()
        .find(|version| version.id == version_id)
        .cloned()
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Version not found" })),
        )
            .into_response();
    };

    let number = record.versions.last().unwrap().version_number + 1;
    let restored = Version {
        id: uuid::Uuid::new_v4().to_string(),
        document_id: id.clone(),
        version_number: number,
        content: target.content.clone(),
        content_hash: format!("hash-{number}"),
        created_at: Utc::now(),
        author: target.author.clone(),
        commit_message: Some(format!("Restored from version {}", target.version_number)),
        save_type: SaveType::Manual,
        parent_version_id: Some(target.id.clone()),
    };
    record.versions.push(restored.clone());
    record.document.current_version_number = number;

    Json(restored).into_response()
}
