//! Artifact download and integrity verification

pub mod downloader;
pub mod verify;

pub use downloader::{ArtifactDownloader, DownloadedArtifact};
pub use verify::verify_ndjson;
