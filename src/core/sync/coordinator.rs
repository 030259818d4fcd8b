//! Sync coordinator - main orchestrator for a sync run
//!
//! For each configured entity, in order: read the checkpoint, derive the
//! incremental lower bound, render the query, run the extract unit (await
//! slot, submit, poll, download) with retry, reconstruct, write the processed
//! file, upload it, and record the checkpoint. One entity failing never stops
//! the next one.

use crate::adapters::shopify::{default_query, render_query, BulkOperationApi, ShopifyClient};
use crate::adapters::storage::{
    ArtifactUploader, CheckpointStore, JsonFileCheckpointStore, LocalDirectoryUploader,
};
use crate::config::{ShopSyncConfig, SyncMode};
use crate::core::download::{ArtifactDownloader, DownloadedArtifact};
use crate::core::job::{JobOutcome, JobRunner, PollSettings};
use crate::core::reconstruct::{reconstruct_file, Reconstruction};
use crate::core::state::{CheckpointManager, CheckpointOutcome};
use crate::core::sync::paths::{upload_key, OutputLayout};
use crate::core::sync::summary::{EntityReport, SyncSummary};
use crate::core::transform::transform_records;
use crate::domain::{EntityKind, JobId, Result, SyncError};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use uuid::Uuid;

/// Checkpoint and output name of the shop snapshot
pub const SHOP_INFO_ENTITY: &str = "shop_info";

/// Lower bound for an incremental query
///
/// `None` means a full extract: either `mode` is full or the entity never
/// completed a cycle.
pub fn lower_bound(
    mode: SyncMode,
    last_success: Option<DateTime<Utc>>,
    overlap_minutes: i64,
) -> Option<DateTime<Utc>> {
    match mode {
        SyncMode::Full => None,
        SyncMode::Incremental => {
            last_success.map(|at| at - ChronoDuration::minutes(overlap_minutes))
        }
    }
}

/// What a run would do for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityPlan {
    pub entity: EntityKind,
    pub mode: SyncMode,
    pub last_success: Option<DateTime<Utc>>,
    pub since: Option<DateTime<Utc>>,
    /// The query carries the incremental filter
    pub filtered: bool,
    /// The query comes from `[sync.queries]`
    pub query_override: bool,
}

/// Artifacts of one successful cycle
#[derive(Debug)]
struct CycleResult {
    records: u64,
    dropped: u64,
    file_size: u64,
    partial: bool,
    sha256: Option<String>,
    output: PathBuf,
    uploaded_to: Option<String>,
}

/// Sync coordinator
pub struct SyncCoordinator {
    config: ShopSyncConfig,
    api: Arc<dyn BulkOperationApi>,
    runner: JobRunner,
    downloader: ArtifactDownloader,
    checkpoints: CheckpointManager,
    uploader: Option<Arc<dyn ArtifactUploader>>,
    layout: OutputLayout,
    shutdown: watch::Receiver<bool>,
}

impl SyncCoordinator {
    /// Create a coordinator over the given remote API and checkpoint store
    ///
    /// The downloader and the optional local uploader are built from `config`.
    pub fn new(
        config: ShopSyncConfig,
        api: Arc<dyn BulkOperationApi>,
        store: Arc<dyn CheckpointStore>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let downloader = ArtifactDownloader::new(config.bulk.max_wait())?;
        let runner = JobRunner::new(api.clone(), PollSettings::from(&config.bulk));

        let uploader: Option<Arc<dyn ArtifactUploader>> = if config.upload.enabled {
            let target = config.upload.target_dir.clone().ok_or_else(|| {
                SyncError::Configuration(
                    "upload.target_dir is required when upload is enabled".to_string(),
                )
            })?;
            Some(Arc::new(LocalDirectoryUploader::new(target)))
        } else {
            None
        };

        Ok(Self {
            layout: OutputLayout::new(config.sync.data_dir.clone()),
            config,
            api,
            runner,
            downloader,
            checkpoints: CheckpointManager::new(store),
            uploader,
            shutdown,
        })
    }

    /// Create a coordinator talking to the configured shop
    pub fn from_config(config: ShopSyncConfig, shutdown: watch::Receiver<bool>) -> Result<Self> {
        let api: Arc<dyn BulkOperationApi> = Arc::new(ShopifyClient::new(&config.shopify)?);
        let store: Arc<dyn CheckpointStore> =
            Arc::new(JsonFileCheckpointStore::new(config.state.path.clone()));
        Self::new(config, api, store, shutdown)
    }

    /// Replace the uploader
    pub fn with_uploader(mut self, uploader: Arc<dyn ArtifactUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Describe the run without calling the remote service
    pub async fn plan(&self) -> Result<Vec<EntityPlan>> {
        let mut plans = Vec::with_capacity(self.config.sync.entities.len());
        for &kind in &self.config.sync.entities {
            let last_success = self.checkpoints.last_success(kind.as_str()).await?;
            let since = lower_bound(
                self.config.sync.mode,
                last_success,
                self.config.sync.incremental_overlap_minutes,
            );
            let rendered = render_query(self.query_template(kind), since);
            plans.push(EntityPlan {
                entity: kind,
                mode: self.config.sync.mode,
                last_success,
                since,
                filtered: rendered.filtered,
                query_override: self.config.sync.queries.contains_key(&kind),
            });
        }
        Ok(plans)
    }

    /// Run every configured entity once
    ///
    /// Per-entity failures are reported in the summary, not returned. Entities
    /// not started before a shutdown request are reported as interrupted.
    pub async fn execute(&self) -> SyncSummary {
        let run_id = Uuid::new_v4();
        let start_time = Instant::now();
        let mut summary = SyncSummary::new(run_id);

        tracing::info!(
            run_id = %run_id,
            mode = %self.config.sync.mode,
            entities = self.config.sync.entities.len(),
            "Starting sync run"
        );

        if self.config.sync.include_shop_info {
            if self.shutdown_requested() {
                summary.push(EntityReport::interrupted(SHOP_INFO_ENTITY));
            } else {
                summary.push(self.sync_shop_info().await);
            }
        }

        for &kind in &self.config.sync.entities {
            if self.shutdown_requested() {
                tracing::warn!(entity = %kind, "Shutdown requested; skipping entity");
                summary.push(EntityReport::interrupted(kind.as_str()));
                continue;
            }
            summary.push(self.sync_entity(kind).await);
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        summary
    }

    /// Run one entity's cycle and record its checkpoint
    pub async fn sync_entity(&self, kind: EntityKind) -> EntityReport {
        let name = kind.as_str();
        let started_at = Utc::now();
        let timer = Instant::now();
        let mut job_id: Option<JobId> = None;

        tracing::info!(entity = %kind, "Syncing entity");
        let result = self.run_cycle(kind, started_at, &mut job_id).await;

        // A partial cycle still moves last_success forward
        let outcome = match &result {
            Ok(cycle) => CheckpointOutcome::Succeeded {
                started_at,
                records_count: cycle.records,
                file_size: cycle.file_size,
                job_id: job_id.clone(),
                partial: cycle.partial,
                artifact_sha256: cycle.sha256.clone(),
                dropped_records: cycle.dropped,
            },
            Err(e) => CheckpointOutcome::failed(started_at, e.to_string(), job_id.clone()),
        };

        let recorded = self.checkpoints.record_outcome(name, outcome).await;

        let report = match (result, recorded) {
            (Ok(cycle), Ok(_)) => {
                crate::log_entity_complete!(kind, cycle.records, cycle.dropped, timer.elapsed());
                let mut report = EntityReport::succeeded(name);
                report.records = cycle.records;
                report.dropped = cycle.dropped;
                report.file_size = cycle.file_size;
                report.partial = cycle.partial;
                report.output = Some(cycle.output);
                report.uploaded_to = cycle.uploaded_to;
                report
            }
            (Err(e), _) | (Ok(_), Err(e)) => {
                tracing::error!(
                    entity = %kind,
                    error_kind = e.kind(),
                    error = %e,
                    "Entity sync failed"
                );
                EntityReport::failed(name, &e)
            }
        };

        let mut report = report.with_duration(timer.elapsed());
        report.job_id = job_id.map(JobId::into_inner);
        report
    }

    async fn run_cycle(
        &self,
        kind: EntityKind,
        started_at: DateTime<Utc>,
        job_id: &mut Option<JobId>,
    ) -> Result<CycleResult> {
        let name = kind.as_str();
        let last_success = self.checkpoints.last_success(name).await?;
        let since = lower_bound(
            self.config.sync.mode,
            last_success,
            self.config.sync.incremental_overlap_minutes,
        );

        let rendered = render_query(self.query_template(kind), since);
        if since.is_some() && !rendered.filtered {
            tracing::warn!(
                entity = %kind,
                "Query override has no incremental filter marker; running a full extract"
            );
        }
        tracing::info!(
            entity = %kind,
            since = ?since,
            filtered = rendered.filtered,
            "Extract query prepared"
        );

        let raw_path = self.layout.raw_path(name, started_at);
        let (outcome, artifact) = self
            .extract_with_retry(kind, &rendered.text, &raw_path, job_id)
            .await?;

        let reconstruction = match &artifact {
            Some(artifact) => {
                let path = artifact.path.clone();
                tokio::task::spawn_blocking(move || reconstruct_file(kind, &path))
                    .await
                    .map_err(|e| SyncError::Io(format!("Reconstruction task failed: {e}")))??
            }
            None => Reconstruction {
                roots: Vec::new(),
                stats: Default::default(),
            },
        };

        let records = reconstruction.roots.len() as u64;
        let dropped = reconstruction.stats.dropped;
        let shaped = transform_records(
            kind,
            reconstruction.roots,
            self.config.sync.output_format,
            Utc::now(),
        );

        let output = self.layout.processed_path(name, started_at);
        write_json(&output, &shaped).await?;
        let uploaded_to = self.upload(&output, name, started_at).await?;

        Ok(CycleResult {
            records,
            dropped,
            file_size: artifact.as_ref().map(|a| a.bytes).unwrap_or(0),
            partial: outcome.partial,
            sha256: artifact.map(|a| a.sha256),
            output,
            uploaded_to,
        })
    }

    /// Extract unit with retry for retryable errors
    async fn extract_with_retry(
        &self,
        kind: EntityKind,
        query: &str,
        destination: &Path,
        job_id: &mut Option<JobId>,
    ) -> Result<(JobOutcome, Option<DownloadedArtifact>)> {
        let max_attempts = self.config.sync.max_attempts;
        let mut attempt = 1;

        loop {
            match self.extract_once(query, destination, job_id).await {
                Ok(extracted) => return Ok(extracted),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.sync.retry_delay(attempt);
                    tracing::warn!(entity = %kind, error_kind = e.kind(), "Extract attempt failed");
                    crate::log_retry_attempt!(attempt, max_attempts, delay.as_millis() as u64, e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn extract_once(
        &self,
        query: &str,
        destination: &Path,
        job_id: &mut Option<JobId>,
    ) -> Result<(JobOutcome, Option<DownloadedArtifact>)> {
        let outcome = self.runner.run(query).await.inspect_err(|e| {
            if let Some(id) = failed_job_id(e) {
                *job_id = Some(id);
            }
        })?;
        *job_id = Some(outcome.job.id.clone());

        let artifact = match &outcome.artifact_url {
            Some(url) => Some(self.downloader.download(url, destination).await?),
            None => None,
        };
        Ok((outcome, artifact))
    }

    async fn sync_shop_info(&self) -> EntityReport {
        let started_at = Utc::now();
        let timer = Instant::now();

        let result = self.snapshot_shop_info(started_at).await;
        let outcome = match &result {
            Ok(_) => CheckpointOutcome::succeeded(started_at, 1),
            Err(e) => CheckpointOutcome::failed(started_at, e.to_string(), None),
        };
        let recorded = self
            .checkpoints
            .record_outcome(SHOP_INFO_ENTITY, outcome)
            .await;

        let report = match (result, recorded) {
            (Ok((output, file_size, uploaded_to)), Ok(_)) => {
                tracing::info!(path = %output.display(), "Shop info saved");
                let mut report = EntityReport::succeeded(SHOP_INFO_ENTITY);
                report.records = 1;
                report.file_size = file_size;
                report.output = Some(output);
                report.uploaded_to = uploaded_to;
                report
            }
            (Err(e), _) | (Ok(_), Err(e)) => {
                crate::log_error_with_context!(&e, "Shop info snapshot failed");
                EntityReport::failed(SHOP_INFO_ENTITY, &e)
            }
        };
        report.with_duration(timer.elapsed())
    }

    async fn snapshot_shop_info(
        &self,
        started_at: DateTime<Utc>,
    ) -> Result<(PathBuf, u64, Option<String>)> {
        let info = self.api.shop_info().await?;
        let output = self.layout.processed_path(SHOP_INFO_ENTITY, started_at);
        let size = write_json(&output, &info).await?;
        let uploaded_to = self.upload(&output, SHOP_INFO_ENTITY, started_at).await?;
        Ok((output, size, uploaded_to))
    }

    async fn upload(
        &self,
        path: &Path,
        entity: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let Some(uploader) = &self.uploader else {
            return Ok(None);
        };
        let key = upload_key(&self.config.upload.prefix, entity, at);
        let location = uploader.upload(path, &key).await?;
        tracing::info!(entity = %entity, location = %location, "Processed file uploaded");
        Ok(Some(location))
    }

    fn query_template(&self, kind: EntityKind) -> &str {
        self.config
            .sync
            .queries
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| default_query(kind))
    }
}

fn failed_job_id(error: &SyncError) -> Option<JobId> {
    match error {
        SyncError::RemoteJob { job_id, .. } | SyncError::TimedOut { job_id, .. } => {
            JobId::new(job_id.clone()).ok()
        }
        _ => None,
    }
}

/// Write `value` as pretty JSON and return the byte count
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, &body).await.map_err(|e| {
        SyncError::Io(format!("Failed to write {}: {e}", path.display()))
    })?;
    Ok(body.len() as u64)
}
