//! Bulk job domain model
//!
//! A [`BulkJob`] is the local view of one remote bulk operation. It is only
//! ever produced by polling the remote service; nothing in this crate mutates
//! a job's status locally.

use super::ids::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote status of a bulk job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted but not yet started
    Created,
    /// Exporting objects
    Running,
    /// Finished; the result file is ready
    Completed,
    /// Finished with an error; a partial result may exist
    Failed,
    /// Cancellation requested, not yet effective
    Canceling,
    /// Cancelled
    Canceled,
    /// Result file is no longer available
    Expired,
}

impl JobStatus {
    /// Whether the remote service will never change this status again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled | JobStatus::Expired
        )
    }

    /// Whether the job still occupies the account-level bulk slot
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Created => "CREATED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Canceling => "CANCELING",
            JobStatus::Canceled => "CANCELED",
            JobStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a remote bulk job as observed by one poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkJob {
    pub id: JobId,
    pub status: JobStatus,
    pub error_code: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub object_count: u64,
    pub file_size: u64,
    pub url: Option<String>,
    pub partial_data_url: Option<String>,
}

impl BulkJob {
    /// Create a job snapshot with only an id and a status
    pub fn new(id: JobId, status: JobStatus) -> Self {
        Self {
            id,
            status,
            error_code: None,
            created_at: None,
            completed_at: None,
            object_count: 0,
            file_size: 0,
            url: None,
            partial_data_url: None,
        }
    }

    /// Set the object count
    pub fn with_object_count(mut self, count: u64) -> Self {
        self.object_count = count;
        self
    }

    /// Set the result file size
    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = size;
        self
    }

    /// Set the result URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the partial result URL
    pub fn with_partial_data_url(mut self, url: impl Into<String>) -> Self {
        self.partial_data_url = Some(url.into());
        self
    }

    /// Set the error code
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Result URL, ignoring empty strings
    pub fn result_url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    /// Partial result URL, ignoring empty strings
    pub fn partial_url(&self) -> Option<&str> {
        non_empty(self.partial_data_url.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn job(status: JobStatus) -> BulkJob {
        BulkJob::new(JobId::new("gid://shopify/BulkOperation/1").unwrap(), status)
    }

    #[test_case(JobStatus::Created, false)]
    #[test_case(JobStatus::Running, false)]
    #[test_case(JobStatus::Canceling, false)]
    #[test_case(JobStatus::Completed, true)]
    #[test_case(JobStatus::Failed, true)]
    #[test_case(JobStatus::Canceled, true)]
    #[test_case(JobStatus::Expired, true)]
    fn test_status_is_terminal(status: JobStatus, terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
        assert_eq!(status.is_active(), !terminal);
    }

    #[test]
    fn test_status_wire_format() {
        let status: JobStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(status, JobStatus::Running);
        assert_eq!(
            serde_json::to_string(&JobStatus::Canceled).unwrap(),
            "\"CANCELED\""
        );
        assert!(serde_json::from_str::<JobStatus>("\"PAUSED\"").is_err());
    }

    #[test]
    fn test_empty_urls_are_ignored() {
        let job = job(JobStatus::Completed)
            .with_url("")
            .with_partial_data_url("  ");
        assert!(job.result_url().is_none());
        assert!(job.partial_url().is_none());

        let job = job.with_url("https://storage.example.com/export.jsonl");
        assert_eq!(
            job.result_url(),
            Some("https://storage.example.com/export.jsonl")
        );
    }
}
