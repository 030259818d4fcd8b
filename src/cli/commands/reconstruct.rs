//! Reconstruct command implementation
//!
//! Replays the processing stage over an artifact that is already on disk:
//! verify, reconstruct, shape, write. Shopify is not contacted and no
//! checkpoint is touched.

use crate::core::download::verify_ndjson;
use crate::core::reconstruct::reconstruct_file;
use crate::core::transform::{transform_records, OutputFormat};
use crate::domain::EntityKind;
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;
use std::str::FromStr;

/// Arguments for the reconstruct command
#[derive(Args, Debug)]
pub struct ReconstructArgs {
    /// Entity the artifact was exported for
    #[arg(long)]
    pub entity: String,

    /// NDJSON artifact to read
    #[arg(long)]
    pub input: PathBuf,

    /// JSON file to write
    #[arg(long)]
    pub output: PathBuf,

    /// Output format (preserve or flatten)
    #[arg(long, default_value = "preserve")]
    pub format: String,
}

impl ReconstructArgs {
    /// Execute the reconstruct command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let kind = match EntityKind::from_str(&self.entity) {
            Ok(kind) => kind,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };
        let format = match OutputFormat::from_str(&self.format) {
            Ok(format) => format,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        tracing::info!(
            entity = %kind,
            input = %self.input.display(),
            output = %self.output.display(),
            format = %format,
            "Reconstructing local artifact"
        );

        let input = self.input.clone();
        let result = tokio::task::spawn_blocking(move || {
            verify_ndjson(&input)?;
            reconstruct_file(kind, &input)
        })
        .await?;

        let reconstruction = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Reconstruction failed");
                eprintln!("❌ Reconstruction failed: {e}");
                return Ok(1);
            }
        };

        let stats = reconstruction.stats;
        let records = transform_records(kind, reconstruction.roots, format, Utc::now());

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.output, serde_json::to_vec_pretty(&records)?).await?;

        println!("✅ Wrote {} {} to {}", records.len(), kind, self.output.display());
        println!("   Attached children: {}", stats.attached);
        if stats.dropped > 0 {
            println!("   ⚠️  Dropped records: {}", stats.dropped);
        }
        Ok(0)
    }
}
