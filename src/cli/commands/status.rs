//! Status command implementation
//!
//! This module implements the `status` command for displaying per-entity
//! sync checkpoints.

use crate::adapters::storage::JsonFileCheckpointStore;
use crate::config::load_config;
use crate::core::state::{CheckpointManager, SyncCheckpoint};
use clap::Args;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Filter by entity name
    #[arg(long)]
    pub entity: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking sync status");

        println!("📊 Sync Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let store = Arc::new(JsonFileCheckpointStore::new(config.state.path.clone()));
        let manager = CheckpointManager::new(store);

        let checkpoints = match manager.all().await {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load checkpoints");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        if checkpoints.is_empty() {
            println!("No sync history found.");
            println!("Run 'shopsync sync' to start syncing data.");
            return Ok(0);
        }

        let filter = self.entity.as_deref().map(normalize_entity);
        let rows: Vec<_> = checkpoints
            .iter()
            .filter(|(name, _)| filter.as_deref().map_or(true, |f| f == name.as_str()))
            .collect();

        if rows.is_empty() {
            println!("No checkpoints match the specified entity.");
            return Ok(0);
        }

        println!("Found {} checkpoint(s):", rows.len());
        println!();
        println!(
            "{:<20} {:<12} {:<10} {:<22} {:<22} {:<8}",
            "Entity", "Status", "Records", "Last Success", "Last Attempt", "Dropped"
        );
        println!("{}", "-".repeat(100));

        for (name, checkpoint) in &rows {
            let last_success = checkpoint
                .last_success
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "Never".to_string());
            println!(
                "{:<20} {:<12} {:<10} {:<22} {:<22} {:<8}",
                name,
                status_label(checkpoint),
                checkpoint.records_count,
                last_success,
                checkpoint.last_attempt.format("%Y-%m-%d %H:%M:%S"),
                checkpoint.dropped_records
            );
        }

        let failures: Vec<_> = rows.iter().filter(|(_, c)| c.is_failed()).collect();
        if !failures.is_empty() {
            println!();
            println!("Last errors:");
            for (name, checkpoint) in failures {
                println!(
                    "  - {name}: {}",
                    checkpoint.error.as_deref().unwrap_or_default()
                );
            }
        }

        println!();
        Ok(0)
    }
}

fn normalize_entity(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

fn status_label(checkpoint: &SyncCheckpoint) -> &'static str {
    if checkpoint.is_failed() {
        "❌ Failed"
    } else if checkpoint.partial {
        "⚠️ Partial"
    } else {
        "✅ OK"
    }
}
