//! Per-entity sync checkpoint
//!
//! A checkpoint records the last attempt and the last fully successful cycle
//! of one entity. `last_success` is the only field that feeds back into the
//! next run (as the incremental lower bound), so it moves forward on success
//! and is carried over unchanged on failure.

use crate::domain::ids::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Checkpoints keyed by entity name
pub type CheckpointMap = BTreeMap<String, SyncCheckpoint>;

/// Durable state of one entity
///
/// # Examples
///
/// ```
/// use shopsync::core::state::{CheckpointOutcome, SyncCheckpoint};
/// use chrono::Utc;
///
/// let started = Utc::now();
/// let checkpoint = SyncCheckpoint::apply(
///     None,
///     CheckpointOutcome::failed(started, "bulk job timed out", None),
/// );
/// assert!(checkpoint.last_success.is_none());
/// assert!(checkpoint.error.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCheckpoint {
    /// Start of the most recent cycle, successful or not
    pub last_attempt: DateTime<Utc>,

    /// Start of the most recent fully successful cycle
    pub last_success: Option<DateTime<Utc>>,

    /// Root records written by the last successful cycle
    #[serde(default)]
    pub records_count: u64,

    /// Size in bytes of the last downloaded artifact
    #[serde(default)]
    pub file_size: u64,

    /// Error of the most recent cycle, cleared on success
    #[serde(default)]
    pub error: Option<String>,

    /// Remote job of the most recent cycle
    #[serde(default)]
    pub job_id: Option<String>,

    /// Whether the last successful cycle used a partial result
    #[serde(default)]
    pub partial: bool,

    /// SHA-256 of the last downloaded artifact
    #[serde(default)]
    pub artifact_sha256: Option<String>,

    /// Records dropped by reconstruction in the last successful cycle
    #[serde(default)]
    pub dropped_records: u64,
}

/// What happened in one cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointOutcome {
    Succeeded {
        started_at: DateTime<Utc>,
        records_count: u64,
        file_size: u64,
        job_id: Option<JobId>,
        partial: bool,
        artifact_sha256: Option<String>,
        dropped_records: u64,
    },
    Failed {
        started_at: DateTime<Utc>,
        error: String,
        job_id: Option<JobId>,
    },
}

impl CheckpointOutcome {
    /// Successful cycle that only carries a record count
    pub fn succeeded(started_at: DateTime<Utc>, records_count: u64) -> Self {
        CheckpointOutcome::Succeeded {
            started_at,
            records_count,
            file_size: 0,
            job_id: None,
            partial: false,
            artifact_sha256: None,
            dropped_records: 0,
        }
    }

    pub fn failed(
        started_at: DateTime<Utc>,
        error: impl Into<String>,
        job_id: Option<JobId>,
    ) -> Self {
        CheckpointOutcome::Failed {
            started_at,
            error: error.into(),
            job_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckpointOutcome::Succeeded { .. })
    }
}

impl SyncCheckpoint {
    /// Fold an outcome into the previous checkpoint
    ///
    /// On failure the volume fields and `last_success` of `previous` are kept.
    pub fn apply(previous: Option<&SyncCheckpoint>, outcome: CheckpointOutcome) -> SyncCheckpoint {
        match outcome {
            CheckpointOutcome::Succeeded {
                started_at,
                records_count,
                file_size,
                job_id,
                partial,
                artifact_sha256,
                dropped_records,
            } => SyncCheckpoint {
                last_attempt: started_at,
                last_success: Some(started_at),
                records_count,
                file_size,
                error: None,
                job_id: job_id.map(JobId::into_inner),
                partial,
                artifact_sha256,
                dropped_records,
            },
            CheckpointOutcome::Failed {
                started_at,
                error,
                job_id,
            } => {
                let mut next = previous.cloned().unwrap_or(SyncCheckpoint {
                    last_attempt: started_at,
                    last_success: None,
                    records_count: 0,
                    file_size: 0,
                    error: None,
                    job_id: None,
                    partial: false,
                    artifact_sha256: None,
                    dropped_records: 0,
                });
                next.last_attempt = started_at;
                next.error = Some(error);
                next.job_id = job_id.map(JobId::into_inner);
                next
            }
        }
    }

    /// Whether the most recent cycle failed
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
