//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the shopsync configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates; a second pass would report the same message
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let entities: Vec<&str> = config.sync.entities.iter().map(|k| k.as_str()).collect();
        let overrides: Vec<&str> = config.sync.queries.keys().map(|k| k.as_str()).collect();

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  GraphQL Endpoint: {}", config.shopify.graphql_endpoint());
        println!("  API Version: {}", config.shopify.api_version);
        println!("  Access Token: ***");
        println!("  Sync Mode: {}", config.sync.mode);
        println!("  Entities: {}", entities.join(", "));
        if !overrides.is_empty() {
            println!("  Query Overrides: {}", overrides.join(", "));
        }
        println!(
            "  Incremental Overlap: {} min",
            config.sync.incremental_overlap_minutes
        );
        println!("  Max Attempts: {}", config.sync.max_attempts);
        println!("  Output Format: {}", config.sync.output_format);
        println!("  Data Directory: {}", config.sync.data_dir.display());
        println!("  Shop Info: {}", config.sync.include_shop_info);
        println!(
            "  Poll Interval: {}s (max wait {}s)",
            config.bulk.poll_interval_secs, config.bulk.max_wait_secs
        );
        println!("  Checkpoints: {}", config.state.path.display());
        match (config.upload.enabled, &config.upload.target_dir) {
            (true, Some(target)) => println!(
                "  Upload: {} (prefix '{}')",
                target.display(),
                config.upload.prefix
            ),
            _ => println!("  Upload: disabled"),
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_creation() {
        let args = ValidateArgs {};
        let _ = format!("{args:?}");
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let code = ValidateArgs {}
            .execute("/nonexistent/shopsync.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
