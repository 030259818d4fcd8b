//! Sync summary and reporting
//!
//! One [`EntityReport`] is produced per configured entity, whatever happened
//! to it.

use crate::domain::SyncError;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Final state of one entity in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Succeeded,
    Failed,
    /// Not started because shutdown was requested
    Interrupted,
}

/// Result of one entity's cycle
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub entity: String,
    pub status: EntityStatus,
    pub records: u64,
    pub dropped: u64,
    pub file_size: u64,
    pub partial: bool,
    pub job_id: Option<String>,
    pub output: Option<PathBuf>,
    pub uploaded_to: Option<String>,
    /// Short error kind, see [`SyncError::kind`]
    pub error_kind: Option<&'static str>,
    pub error: Option<String>,
    #[serde(skip)]
    pub duration: Duration,
}

impl EntityReport {
    fn empty(entity: &str, status: EntityStatus) -> Self {
        Self {
            entity: entity.to_string(),
            status,
            records: 0,
            dropped: 0,
            file_size: 0,
            partial: false,
            job_id: None,
            output: None,
            uploaded_to: None,
            error_kind: None,
            error: None,
            duration: Duration::ZERO,
        }
    }

    pub fn succeeded(entity: &str) -> Self {
        Self::empty(entity, EntityStatus::Succeeded)
    }

    pub fn failed(entity: &str, error: &SyncError) -> Self {
        let mut report = Self::empty(entity, EntityStatus::Failed);
        report.error_kind = Some(error.kind());
        report.error = Some(error.to_string());
        report
    }

    pub fn interrupted(entity: &str) -> Self {
        Self::empty(entity, EntityStatus::Interrupted)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == EntityStatus::Succeeded
    }
}

/// Summary of a sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub run_id: Uuid,
    pub reports: Vec<EntityReport>,
    #[serde(skip)]
    pub duration: Duration,
}

impl SyncSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            reports: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn push(&mut self, report: EntityReport) {
        self.reports.push(report);
    }

    pub fn report(&self, entity: &str) -> Option<&EntityReport> {
        self.reports.iter().find(|r| r.entity == entity)
    }

    pub fn succeeded(&self) -> usize {
        self.count(EntityStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(EntityStatus::Failed)
    }

    pub fn interrupted(&self) -> usize {
        self.count(EntityStatus::Interrupted)
    }

    fn count(&self, status: EntityStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }

    pub fn total_records(&self) -> u64 {
        self.reports.iter().map(|r| r.records).sum()
    }

    /// Every entity succeeded and nothing was skipped
    pub fn is_successful(&self) -> bool {
        self.reports.iter().all(EntityReport::is_success)
    }

    pub fn was_interrupted(&self) -> bool {
        self.interrupted() > 0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.reports.is_empty() {
            return 100.0;
        }
        (self.succeeded() as f64 / self.reports.len() as f64) * 100.0
    }

    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            entities = self.reports.len(),
            succeeded = self.succeeded(),
            failed = self.failed(),
            interrupted = self.interrupted(),
            records = self.total_records(),
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Sync completed"
        );

        for report in self.reports.iter().filter(|r| r.status == EntityStatus::Failed) {
            tracing::warn!(
                entity = %report.entity,
                error_kind = report.error_kind.unwrap_or("unknown"),
                error = report.error.as_deref().unwrap_or(""),
                "Entity failed"
            );
        }
    }
}
