//! Diff endpoint wrappers.
//!
//! The diff service is a pure comparison oracle; the client only carries
//! its request options and renders its response.

use crate::gateway::ApiGateway;
use inklet_core::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::Display;

/// Typed access to the `/diff` endpoints.
pub struct DiffApi {
    gateway: Arc<ApiGateway>,
}

impl DiffApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Compares two versions by id.
    pub async fn compare_by_id(
        &self,
        version1_id: &str,
        version2_id: &str,
        options: &DiffOptions,
    ) -> Result<DiffResponse> {
        self.gateway
            .get(
                &format!("/diff/{version1_id}/{version2_id}"),
                &options.to_query(),
            )
            .await
    }

    /// Compares two versions of a document by version number.
    pub async fn compare_by_number(
        &self,
        document_id: &str,
        number1: u64,
        number2: u64,
        options: &DiffOptions,
    ) -> Result<DiffResponse> {
        self.gateway
            .get(
                &format!("/diff/document/{document_id}/number/{number1}/{number2}"),
                &options.to_query(),
            )
            .await
    }

    /// Compares a version against the document's latest version.
    pub async fn compare_with_latest(
        &self,
        document_id: &str,
        version_id: &str,
        options: &DiffOptions,
    ) -> Result<DiffResponse> {
        self.gateway
            .get(
                &format!("/diff/document/{document_id}/latest/{version_id}"),
                &options.to_query(),
            )
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiffMode {
    Character,
    Word,
    Line,
    Semantic,
}

/// Options forwarded to the comparison service.
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    pub diff_mode: Option<DiffMode>,
    pub ignore_whitespace: Option<bool>,
    pub ignore_case: Option<bool>,
}

impl DiffOptions {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(mode) = self.diff_mode {
            query.push(("diff_mode", mode.to_string()));
        }
        if let Some(ignore_whitespace) = self.ignore_whitespace {
            query.push(("ignore_whitespace", ignore_whitespace.to_string()));
        }
        if let Some(ignore_case) = self.ignore_case {
            query.push(("ignore_case", ignore_case.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffChangeKind {
    Added,
    Deleted,
    Modified,
    Unchanged,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffChange {
    #[serde(rename = "type")]
    pub kind: DiffChangeKind,
    #[serde(default)]
    pub old_text: Option<String>,
    #[serde(default)]
    pub new_text: Option<String>,
    #[serde(default)]
    pub old_line_start: Option<u64>,
    #[serde(default)]
    pub old_line_end: Option<u64>,
    #[serde(default)]
    pub new_line_start: Option<u64>,
    #[serde(default)]
    pub new_line_end: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffStats {
    pub added: u64,
    pub deleted: u64,
    pub modified: u64,
    pub unchanged: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffResponse {
    pub old_version_id: String,
    pub new_version_id: String,
    pub old_version_number: u64,
    pub new_version_number: u64,
    pub changes: Vec<DiffChange>,
    pub stats: DiffStats,
}
