//! Checkpoint and upload backends

pub mod file;
pub mod local;
pub mod traits;

pub use file::JsonFileCheckpointStore;
pub use local::LocalDirectoryUploader;
pub use traits::{ArtifactUploader, CheckpointStore};
