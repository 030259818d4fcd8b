//! Storage abstraction traits
//!
//! Checkpoint persistence and processed-output upload are both behind traits
//! so that other backends can be plugged in without touching the sync loop.

use crate::core::state::CheckpointMap;
use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

/// Durable store for the whole checkpoint map
///
/// Implementations replace the stored map atomically on `save_all`.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load every checkpoint; a store that was never written yields an empty map
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`](crate::domain::SyncError::State) if the
    /// stored data cannot be read or decoded.
    async fn load_all(&self) -> Result<CheckpointMap>;

    /// Replace the stored map
    async fn save_all(&self, checkpoints: &CheckpointMap) -> Result<()>;
}

/// Destination for processed output files
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Copy `local_path` to `key` and return the resulting location
    async fn upload(&self, local_path: &Path, key: &str) -> Result<String>;
}
