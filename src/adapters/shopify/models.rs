//! Admin API wire models
//!
//! These mirror the GraphQL response payloads and are kept separate from the
//! domain [`BulkJob`]. Conversion happens in [`BulkOperationNode::into_domain`].

use crate::domain::ids::JobId;
use crate::domain::{BulkJob, JobStatus, Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// GraphQL request body
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

/// GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

/// One entry of a GraphQL `errors` array
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    /// `extensions.code`, when the server sets one
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunQueryData {
    #[serde(rename = "bulkOperationRunQuery")]
    pub run: Option<RunQueryPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryPayload {
    pub bulk_operation: Option<SubmittedOperation>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedOperation {
    pub id: String,
    pub status: JobStatus,
}

/// Validation error reported by a mutation
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) if !field.is_empty() => write!(f, "{}: {}", field.join("."), self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentOperationData {
    #[serde(rename = "currentBulkOperation")]
    pub current: Option<BulkOperationNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopData {
    pub shop: Option<Value>,
}

/// `BulkOperation` object as returned by `currentBulkOperation`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationNode {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub object_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub file_size: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub partial_data_url: Option<String>,
}

impl BulkOperationNode {
    /// Convert to the domain model
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Api`] if the id is empty
    pub fn into_domain(self) -> Result<BulkJob> {
        let id = JobId::new(self.id).map_err(SyncError::Api)?;
        Ok(BulkJob {
            id,
            status: self.status,
            error_code: self.error_code,
            created_at: self.created_at,
            completed_at: self.completed_at,
            object_count: self.object_count,
            file_size: self.file_size,
            url: self.url,
            partial_data_url: self.partial_data_url,
        })
    }
}

/// UInt64 scalars arrive as strings; accept strings, numbers and null
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Raw::Number(n)) => Ok(n),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(Raw::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
