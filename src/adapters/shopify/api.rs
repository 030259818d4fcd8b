//! Remote bulk operation contract
//!
//! [`BulkOperationApi`] is the seam between the orchestration core and the
//! Admin API. The job state machine and the sync coordinator only see this
//! trait, so tests drive them with scripted fakes.

use crate::domain::ids::JobId;
use crate::domain::{BulkJob, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Operations the orchestrator needs from the remote service
///
/// All methods are safe to retry. Implementations own authentication and
/// transport-level retries.
#[async_trait]
pub trait BulkOperationApi: Send + Sync {
    /// Submit a bulk query and return the id of the created job
    ///
    /// # Errors
    ///
    /// [`SyncError::UserInput`](crate::domain::SyncError::UserInput) when the
    /// service rejects the query.
    async fn submit(&self, query: &str) -> Result<JobId>;

    /// The account's current (most recent) bulk job, if any
    async fn current_job(&self) -> Result<Option<BulkJob>>;

    /// Shop profile, fetched with a regular query
    async fn shop_info(&self) -> Result<Value>;
}
