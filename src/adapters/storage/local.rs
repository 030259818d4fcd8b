//! Local directory uploader
//!
//! Mirrors processed files into a directory tree using the same keys an
//! object store would use. Useful on its own for shared volumes, and as the
//! reference [`ArtifactUploader`] in tests.

use super::traits::ArtifactUploader;
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

pub struct LocalDirectoryUploader {
    root: PathBuf,
}

impl LocalDirectoryUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn destination(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(SyncError::Io(format!("Invalid upload key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactUploader for LocalDirectoryUploader {
    async fn upload(&self, local_path: &Path, key: &str) -> Result<String> {
        let destination = self.destination(key)?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &destination).await.map_err(|e| {
            SyncError::Io(format!(
                "Failed to upload {} to {}: {e}",
                local_path.display(),
                destination.display()
            ))
        })?;

        tracing::info!(
            source = %local_path.display(),
            destination = %destination.display(),
            "Uploaded processed file"
        );
        Ok(destination.display().to_string())
    }
}
