//! JSON file checkpoint store

use super::traits::CheckpointStore;
use crate::core::state::CheckpointMap;
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Stores all checkpoints in one pretty-printed JSON object
///
/// Writes go to `<path>.tmp` and are renamed over `path`, so a crash mid-write
/// leaves the previous file intact.
pub struct JsonFileCheckpointStore {
    path: PathBuf,
}

impl JsonFileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl CheckpointStore for JsonFileCheckpointStore {
    async fn load_all(&self) -> Result<CheckpointMap> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CheckpointMap::new()),
            Err(e) => {
                return Err(SyncError::State(format!(
                    "Failed to read checkpoint file {}: {e}",
                    self.path.display()
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(CheckpointMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            SyncError::State(format!(
                "Checkpoint file {} is corrupt: {e}",
                self.path.display()
            ))
        })
    }

    async fn save_all(&self, checkpoints: &CheckpointMap) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SyncError::State(format!(
                    "Failed to create state directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(checkpoints)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| SyncError::State(format!("Failed to write {}: {e}", temp.display())))?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            SyncError::State(format!(
                "Failed to replace checkpoint file {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{CheckpointOutcome, SyncCheckpoint};
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileCheckpointStore::new(dir.path().join("none.json"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileCheckpointStore::new(dir.path().join("nested/state.json"));

        let mut map = CheckpointMap::new();
        map.insert(
            "orders".to_string(),
            SyncCheckpoint::apply(None, CheckpointOutcome::succeeded(Utc::now(), 7)),
        );
        store.save_all(&map).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded, map);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_state_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileCheckpointStore::new(&path);
        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, SyncError::State(_)));
    }
}
