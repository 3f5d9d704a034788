//! Version-history endpoint wrappers.
//!
//! Versions are created and numbered by the server. Restoring is a POST
//! that appends a copy of the target version; nothing here ever rewrites an
//! existing snapshot.

use crate::gateway::{specialize_not_found, ApiGateway};
use inklet_core::{Result, SaveType, Version, VersionListItem};
use serde::Serialize;
use std::sync::Arc;

/// Typed access to the version-history endpoints.
pub struct VersionsApi {
    gateway: Arc<ApiGateway>,
}

impl VersionsApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Creates a new version from the given content.
    pub async fn create(&self, document_id: &str, request: &VersionCreate) -> Result<Version> {
        self.gateway
            .post(&format!("/documents/{document_id}/versions"), Some(request))
            .await
    }

    /// Lists versions for a document, newest first.
    pub async fn list(
        &self,
        document_id: &str,
        params: &VersionListParams,
    ) -> Result<Vec<VersionListItem>> {
        self.gateway
            .get(
                &format!("/documents/{document_id}/versions"),
                &params.to_query(),
            )
            .await
    }

    /// Fetches one version including its content.
    pub async fn get(&self, document_id: &str, version_id: &str) -> Result<Version> {
        self.gateway
            .get(
                &format!("/documents/{document_id}/versions/{version_id}"),
                &[],
            )
            .await
            .map_err(|err| specialize_not_found(err, "version", version_id))
    }

    /// Fetches one version by its per-document number.
    pub async fn get_by_number(&self, document_id: &str, version_number: u64) -> Result<Version> {
        self.gateway
            .get(
                &format!("/documents/{document_id}/versions/number/{version_number}"),
                &[],
            )
            .await
            .map_err(|err| specialize_not_found(err, "version", document_id))
    }

    /// Asks the server to append a new version copying the target one.
    pub async fn restore(&self, document_id: &str, version_id: &str) -> Result<Version> {
        self.gateway
            .post(
                &format!("/documents/{document_id}/restore/{version_id}"),
                None::<&()>,
            )
            .await
            .map_err(|err| specialize_not_found(err, "version", version_id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionCreate {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_type: Option<SaveType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Paging and filtering for version listings.
#[derive(Debug, Clone, Default)]
pub struct VersionListParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub save_type: Option<SaveType>,
}

impl VersionListParams {
    /// The standard newest-first page used when (re)loading a document.
    pub fn newest_page() -> Self {
        Self {
            limit: Some(100),
            ..Default::default()
        }
    }

    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(skip) = self.skip {
            query.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(save_type) = self.save_type {
            query.push(("save_type", save_type.to_string()));
        }
        query
    }
}
