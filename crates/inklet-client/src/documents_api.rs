//! Document endpoint wrappers.

use crate::gateway::{specialize_not_found, ApiGateway};
use inklet_core::{Document, Result};
use serde::Serialize;
use std::sync::Arc;

/// Typed access to the `/documents` endpoints.
pub struct DocumentsApi {
    gateway: Arc<ApiGateway>,
}

impl DocumentsApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn create(&self, request: &DocumentCreate) -> Result<Document> {
        self.gateway.post("/documents", Some(request)).await
    }

    pub async fn list(&self, params: &DocumentListParams) -> Result<Vec<Document>> {
        self.gateway.get("/documents", &params.to_query()).await
    }

    pub async fn get(&self, id: &str) -> Result<Document> {
        self.gateway
            .get(&format!("/documents/{id}"), &[])
            .await
            .map_err(|err| specialize_not_found(err, "document", id))
    }

    pub async fn update(&self, id: &str, request: &DocumentUpdate) -> Result<Document> {
        self.gateway
            .put(&format!("/documents/{id}"), Some(request))
            .await
            .map_err(|err| specialize_not_found(err, "document", id))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.gateway
            .delete_empty(&format!("/documents/{id}"))
            .await
            .map_err(|err| specialize_not_found(err, "document", id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Paging and ordering for document listings.
#[derive(Debug, Clone, Default)]
pub struct DocumentListParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
}

impl DocumentListParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(skip) = self.skip {
            query.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            query.push(("sort_by", sort_by.clone()));
        }
        query
    }
}
