//! Streaming artifact download
//!
//! The result file is streamed to `<destination>.part`, hashed and counted on
//! the way, verified, and only then renamed onto `destination`. A failed
//! download never replaces an existing file.

use super::verify::verify_ndjson;
use crate::domain::{Result, SyncError};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// A verified artifact on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub path: PathBuf,
    pub bytes: u64,
    pub lines: u64,
    /// Hex-encoded SHA-256 of the file contents
    pub sha256: String,
}

pub struct ArtifactDownloader {
    client: Client,
}

impl ArtifactDownloader {
    /// Create a downloader whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Download `url` to `destination`
    ///
    /// # Errors
    ///
    /// - [`SyncError::Transport`] for request failures, non-success statuses
    ///   and interrupted bodies
    /// - [`SyncError::Verification`] if the file fails the integrity check
    /// - [`SyncError::Io`] for local filesystem failures
    pub async fn download(&self, url: &str, destination: &Path) -> Result<DownloadedArtifact> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let part = part_path(destination);

        let committed = async {
            let fetched = self.fetch_and_verify(url, &part).await?;
            tokio::fs::rename(&part, destination).await.map_err(|e| {
                SyncError::Io(format!(
                    "Failed to move {} to {}: {e}",
                    part.display(),
                    destination.display()
                ))
            })?;
            Ok::<_, SyncError>(fetched)
        }
        .await;

        match committed {
            Ok((bytes, lines, sha256)) => {
                tracing::info!(
                    path = %destination.display(),
                    bytes = bytes,
                    lines = lines,
                    sha256 = %sha256,
                    "Artifact downloaded and verified"
                );
                Ok(DownloadedArtifact {
                    path: destination.to_path_buf(),
                    bytes,
                    lines,
                    sha256,
                })
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&part).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            path = %part.display(),
                            error = %remove_err,
                            "Failed to remove partial download"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch_and_verify(&self, url: &str, part: &Path) -> Result<(u64, u64, String)> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("Artifact request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Transport(format!(
                "Artifact download returned HTTP {status}"
            )));
        }

        let mut file = tokio::fs::File::create(part).await?;
        let mut hasher = Sha256::new();
        let mut bytes: u64 = 0;
        let mut lines: u64 = 0;
        let mut last_byte: Option<u8> = None;

        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| SyncError::Transport(format!("Artifact stream interrupted: {e}")))?
        {
            hasher.update(&chunk);
            bytes += chunk.len() as u64;
            lines += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
            last_byte = chunk.last().copied().or(last_byte);
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if matches!(last_byte, Some(b) if b != b'\n') {
            lines += 1;
        }

        let path = part.to_path_buf();
        tokio::task::spawn_blocking(move || verify_ndjson(&path))
            .await
            .map_err(|e| SyncError::Io(format!("Verification task failed: {e}")))??;

        Ok((bytes, lines, format!("{:x}", hasher.finalize())))
    }
}

/// `<destination>.part`
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
