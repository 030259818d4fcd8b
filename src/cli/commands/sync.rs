//! Sync command implementation
//!
//! This module implements the `sync` command, which runs the bulk export
//! cycle for every configured entity.

use crate::config::schema::parse_entity_list;
use crate::config::{load_config, SyncMode};
use crate::core::sync::{EntityPlan, EntityStatus, SyncCoordinator, SyncSummary};
use crate::domain::SyncError;
use clap::Args;
use std::str::FromStr;
use tokio::sync::watch;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Override entities to sync (comma-separated)
    #[arg(long)]
    pub entity: Option<String>,

    /// Override sync mode (full or incremental)
    #[arg(long)]
    pub mode: Option<String>,

    /// Show the plan and incremental bounds without calling Shopify
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting sync command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        // Apply CLI overrides
        if let Some(entities) = &self.entity {
            match parse_entity_list(entities.split(',')) {
                Ok(kinds) => {
                    tracing::info!(entities = ?kinds, "Overriding entities from CLI");
                    config.sync.entities = kinds;
                }
                Err(e) => {
                    eprintln!("Invalid --entity: {e}");
                    return Ok(2);
                }
            }
        }

        if let Some(mode) = &self.mode {
            match SyncMode::from_str(mode) {
                Ok(mode) => {
                    tracing::info!(mode = %mode, "Overriding sync mode from CLI");
                    config.sync.mode = mode;
                }
                Err(e) => {
                    eprintln!("Invalid --mode: {e}");
                    return Ok(2);
                }
            }
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let dry_run = config.application.dry_run;
        let coordinator = match SyncCoordinator::from_config(config, shutdown_signal) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create sync coordinator");
                eprintln!("Failed to initialize sync: {e}");
                return Ok(match e {
                    SyncError::Configuration(_) => 2,
                    _ => 5,
                });
            }
        };

        if dry_run {
            println!("🔍 DRY RUN MODE - Shopify will not be contacted");
            println!();
            return match coordinator.plan().await {
                Ok(plans) => {
                    print_plan(&plans);
                    Ok(0)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to build sync plan");
                    eprintln!("Failed to read checkpoints: {e}");
                    Ok(5)
                }
            };
        }

        println!("🚀 Starting sync...");
        println!();

        let summary = coordinator.execute().await;
        print_summary(&summary);

        Ok(exit_code(&summary))
    }
}

/// Exit code for a finished run
pub fn exit_code(summary: &SyncSummary) -> i32 {
    if summary.was_interrupted() {
        130 // SIGINT exit code (standard Unix convention)
    } else if summary.is_successful() {
        0
    } else {
        1 // Partial failure
    }
}

fn print_plan(plans: &[EntityPlan]) {
    println!(
        "{:<20} {:<12} {:<22} {:<22} {:<10}",
        "Entity", "Mode", "Last Success", "Since", "Query"
    );
    println!("{}", "-".repeat(90));
    for plan in plans {
        let last_success = plan
            .last_success
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Never".to_string());
        let since = plan
            .since
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Full extract".to_string());
        let query = match (plan.query_override, plan.filtered) {
            (true, true) => "override",
            (true, false) => "override*",
            (false, _) => "default",
        };
        println!(
            "{:<20} {:<12} {:<22} {:<22} {:<10}",
            plan.entity, plan.mode, last_success, since, query
        );
    }
    if plans.iter().any(|p| p.since.is_some() && !p.filtered) {
        println!();
        println!("* query override has no incremental filter; a full extract will run");
    }
    println!();
}

fn print_summary(summary: &SyncSummary) {
    println!();
    println!("📊 Sync Summary (run {}):", summary.run_id);
    println!("  Entities: {}", summary.reports.len());
    println!("  Succeeded: {}", summary.succeeded());
    println!("  Failed: {}", summary.failed());
    println!("  Interrupted: {}", summary.interrupted());
    println!("  Records: {}", summary.total_records());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    for report in &summary.reports {
        match report.status {
            EntityStatus::Succeeded => {
                let partial = if report.partial { " (partial)" } else { "" };
                println!(
                    "  ✅ {}: {} records, {} dropped{partial}",
                    report.entity, report.records, report.dropped
                );
                if let Some(output) = &report.output {
                    println!("     Output: {}", output.display());
                }
            }
            EntityStatus::Failed => {
                println!(
                    "  ❌ {}: {}",
                    report.entity,
                    report.error.as_deref().unwrap_or("unknown error")
                );
            }
            EntityStatus::Interrupted => {
                println!("  ⏸️  {}: skipped (shutdown requested)", report.entity);
            }
        }
    }
    println!();

    if summary.was_interrupted() {
        println!("⚠️  Sync interrupted. Completed entities were checkpointed.");
    } else if summary.is_successful() {
        println!("✅ Sync completed successfully!");
    } else {
        println!("⚠️  Sync completed with failures");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::EntityReport;
    use uuid::Uuid;

    #[test]
    fn test_sync_args_defaults() {
        let args = SyncArgs {
            entity: None,
            mode: None,
            dry_run: false,
        };

        assert!(args.entity.is_none());
        assert!(args.mode.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_exit_codes() {
        let mut summary = SyncSummary::new(Uuid::new_v4());
        summary.push(EntityReport::succeeded("orders"));
        assert_eq!(exit_code(&summary), 0);

        summary.push(EntityReport::failed(
            "products",
            &SyncError::Authentication("401".to_string()),
        ));
        assert_eq!(exit_code(&summary), 1);

        summary.push(EntityReport::interrupted("customers"));
        assert_eq!(exit_code(&summary), 130);
    }
}
