//! Checkpoint manager
//!
//! Wraps a [`CheckpointStore`] with the two operations the sync loop needs.
//! Every mutation is a read-modify-write of the whole map; a single writer
//! is assumed.

use crate::adapters::storage::CheckpointStore;
use crate::core::state::checkpoint::{CheckpointMap, CheckpointOutcome, SyncCheckpoint};
use crate::domain::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct CheckpointManager {
    store: Arc<dyn CheckpointStore>,
}

impl CheckpointManager {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    /// Start of the last fully successful cycle for `entity`
    pub async fn last_success(&self, entity: &str) -> Result<Option<DateTime<Utc>>> {
        let all = self.store.load_all().await?;
        Ok(all.get(entity).and_then(|c| c.last_success))
    }

    /// Current checkpoint for `entity`, if any
    pub async fn get(&self, entity: &str) -> Result<Option<SyncCheckpoint>> {
        let mut all = self.store.load_all().await?;
        Ok(all.remove(entity))
    }

    /// Fold one cycle's outcome into the stored checkpoint and persist it
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::State`](crate::domain::SyncError::State) if the
    /// store cannot be read or written.
    pub async fn record_outcome(
        &self,
        entity: &str,
        outcome: CheckpointOutcome,
    ) -> Result<SyncCheckpoint> {
        let mut all = self.store.load_all().await?;
        let success = outcome.is_success();
        let next = SyncCheckpoint::apply(all.get(entity), outcome);
        all.insert(entity.to_string(), next.clone());
        self.store.save_all(&all).await?;

        tracing::debug!(
            entity = %entity,
            success = success,
            last_success = ?next.last_success,
            "Checkpoint recorded"
        );
        Ok(next)
    }

    /// Every stored checkpoint
    pub async fn all(&self) -> Result<CheckpointMap> {
        self.store.load_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::JsonFileCheckpointStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> CheckpointManager {
        let store = JsonFileCheckpointStore::new(dir.path().join("state/sync_state.json"));
        CheckpointManager::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_last_success_absent_initially() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        assert!(manager.last_success("orders").await.unwrap().is_none());
        assert!(manager.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_outcome_round_trip() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap();

        manager
            .record_outcome("orders", CheckpointOutcome::succeeded(t1, 12))
            .await
            .unwrap();
        manager
            .record_outcome("orders", CheckpointOutcome::failed(t2, "boom", None))
            .await
            .unwrap();
        manager
            .record_outcome("products", CheckpointOutcome::succeeded(t2, 3))
            .await
            .unwrap();

        assert_eq!(manager.last_success("orders").await.unwrap(), Some(t1));
        assert_eq!(manager.last_success("products").await.unwrap(), Some(t2));

        let orders = manager.get("orders").await.unwrap().unwrap();
        assert_eq!(orders.last_attempt, t2);
        assert_eq!(orders.error.as_deref(), Some("boom"));
        assert_eq!(manager.all().await.unwrap().len(), 2);
    }
}
