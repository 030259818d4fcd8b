//! Sync checkpoints and their persistence

pub mod checkpoint;
pub mod manager;

pub use checkpoint::{CheckpointMap, CheckpointOutcome, SyncCheckpoint};
pub use manager::CheckpointManager;
