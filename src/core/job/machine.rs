//! Bulk job state machine
//!
//! One [`JobRunner::run`] call drives a job through
//! `SUBMITTED -> POLLING -> {COMPLETED, FAILED, CANCELED, TIMED_OUT}`.
//! The runner holds no durable state; everything it knows comes from polling
//! `current_job()`.

use crate::adapters::shopify::BulkOperationApi;
use crate::config::BulkConfig;
use crate::domain::ids::JobId;
use crate::domain::{BulkJob, JobStatus, Result, SyncError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Timing knobs for one runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub stall_warning: Duration,
}

impl From<&BulkConfig> for PollSettings {
    fn from(config: &BulkConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_wait: config.max_wait(),
            stall_warning: config.stall_warning(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings::from(&BulkConfig::default())
    }
}

/// Successful end of a job
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// Final polled snapshot
    pub job: BulkJob,
    /// Result file to download; `None` for an export that matched nothing
    pub artifact_url: Option<String>,
    /// The job failed remotely but left a partial result
    pub partial: bool,
    /// At least one stall warning was logged while polling
    pub stalled: bool,
    /// Time spent polling the submitted job
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn is_empty_export(&self) -> bool {
        self.artifact_url.is_none()
    }
}

/// Drives bulk jobs against a [`BulkOperationApi`]
pub struct JobRunner {
    api: Arc<dyn BulkOperationApi>,
    settings: PollSettings,
}

impl JobRunner {
    pub fn new(api: Arc<dyn BulkOperationApi>, settings: PollSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Wait for a free slot, submit `query`, and poll the job to its end
    ///
    /// # Errors
    ///
    /// - [`SyncError::TimedOut`] if waiting for the slot and polling the job
    ///   together take longer than `max_wait`
    /// - [`SyncError::RemoteJob`] for FAILED without partial data, CANCELED
    ///   and EXPIRED
    /// - [`SyncError::Api`] if another client takes the slot while polling
    /// - client errors from submission and polling unchanged
    pub async fn run(&self, query: &str) -> Result<JobOutcome> {
        let run_started = Instant::now();
        self.await_idle_slot(run_started).await?;

        let job_id = self.api.submit(query).await?;
        tracing::info!(job_id = %job_id, "Bulk operation submitted");

        let started = Instant::now();
        let (job, stalled) = self.poll_until_terminal(&job_id, run_started).await?;
        resolve_terminal(job, stalled, started.elapsed())
    }

    /// Block until no bulk job is active on the account
    ///
    /// An active job found here is polled to a terminal state; its result is
    /// discarded. The wait counts against the `max_wait` that began at
    /// `run_started`.
    async fn await_idle_slot(&self, run_started: Instant) -> Result<()> {
        match self.api.current_job().await? {
            Some(job) if job.status.is_active() => {
                tracing::warn!(
                    job_id = %job.id,
                    status = %job.status,
                    "Another bulk operation is running; waiting for it to finish"
                );
                let (finished, _) = self.poll_until_terminal(&job.id, run_started).await?;
                tracing::info!(
                    job_id = %finished.id,
                    status = %finished.status,
                    "Previous bulk operation finished"
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn poll_until_terminal(
        &self,
        job_id: &JobId,
        run_started: Instant,
    ) -> Result<(BulkJob, bool)> {
        let mut stall = StallTracker::new(self.settings.stall_warning, Instant::now());
        let mut last_status: Option<JobStatus> = None;

        loop {
            let elapsed = run_started.elapsed();
            if elapsed >= self.settings.max_wait {
                tracing::error!(
                    job_id = %job_id,
                    elapsed_secs = elapsed.as_secs(),
                    "Bulk operation exceeded the maximum wait"
                );
                return Err(SyncError::TimedOut {
                    job_id: job_id.to_string(),
                    elapsed_secs: elapsed.as_secs(),
                });
            }

            let job = self.api.current_job().await?.ok_or_else(|| {
                SyncError::Api(format!(
                    "No current bulk operation while polling {job_id}"
                ))
            })?;

            if &job.id != job_id {
                return Err(SyncError::Api(format!(
                    "Bulk operation slot was taken by {} while polling {job_id}",
                    job.id
                )));
            }

            if last_status != Some(job.status) {
                tracing::info!(
                    job_id = %job.id,
                    status = %job.status,
                    object_count = job.object_count,
                    elapsed_secs = elapsed.as_secs(),
                    "Bulk operation status"
                );
                last_status = Some(job.status);
            }

            if stall.observe(job.object_count, Instant::now()) {
                tracing::warn!(
                    job_id = %job.id,
                    object_count = job.object_count,
                    stalled_secs = self.settings.stall_warning.as_secs(),
                    "Bulk operation appears stalled"
                );
            }

            if job.is_terminal() {
                return Ok((job, stall.observed()));
            }

            tracing::debug!(
                job_id = %job.id,
                object_count = job.object_count,
                "Bulk operation still running"
            );
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

/// Map a terminal snapshot to an outcome or an error
fn resolve_terminal(job: BulkJob, stalled: bool, elapsed: Duration) -> Result<JobOutcome> {
    let outcome = |artifact_url: Option<String>, partial: bool, job: BulkJob| JobOutcome {
        job,
        artifact_url,
        partial,
        stalled,
        elapsed,
    };

    let result_url = job.result_url().map(str::to_string);
    let partial_url = job.partial_url().map(str::to_string);

    match job.status {
        JobStatus::Completed => match result_url {
            Some(url) => Ok(outcome(Some(url), false, job)),
            None if job.object_count == 0 => {
                tracing::info!(job_id = %job.id, "Bulk operation matched no objects");
                Ok(outcome(None, false, job))
            }
            None => Err(SyncError::RemoteJob {
                job_id: job.id.to_string(),
                status: job.status.to_string(),
                error_code: Some(format!(
                    "no result url for {} objects",
                    job.object_count
                )),
            }),
        },
        JobStatus::Failed => match partial_url {
            Some(url) => {
                tracing::warn!(
                    job_id = %job.id,
                    error_code = ?job.error_code,
                    object_count = job.object_count,
                    "Bulk operation failed with partial data; continuing with partial result"
                );
                Ok(outcome(Some(url), true, job))
            }
            None => Err(remote_job_error(&job)),
        },
        _ => Err(remote_job_error(&job)),
    }
}

fn remote_job_error(job: &BulkJob) -> SyncError {
    SyncError::RemoteJob {
        job_id: job.id.to_string(),
        status: job.status.to_string(),
        error_code: job.error_code.clone(),
    }
}

/// Tracks how long the object count has been flat
///
/// Warns once per stall episode; any count change starts a new episode.
#[derive(Debug)]
struct StallTracker {
    threshold: Duration,
    last_count: Option<u64>,
    last_change: Instant,
    warned: bool,
    observed: bool,
}

impl StallTracker {
    fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            last_count: None,
            last_change: now,
            warned: false,
            observed: false,
        }
    }

    /// Record a poll; returns true when a warning should be logged
    fn observe(&mut self, count: u64, now: Instant) -> bool {
        if self.last_count != Some(count) {
            self.last_count = Some(count);
            self.last_change = now;
            self.warned = false;
            return false;
        }
        if !self.warned && now.duration_since(self.last_change) >= self.threshold {
            self.warned = true;
            self.observed = true;
            return true;
        }
        false
    }

    fn observed(&self) -> bool {
        self.observed
    }
}
