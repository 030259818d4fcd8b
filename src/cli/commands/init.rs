//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "shopsync.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing shopsync configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} and set shopify.shop_domain", self.output);
                println!("  2. Create a .env file with SHOPIFY_ACCESS_TOKEN=shpat_...");
                println!("  3. Validate configuration: shopsync validate-config");
                println!("  4. Preview the run: shopsync sync --dry-run");
                println!("  5. Run sync: shopsync sync");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# shopsync configuration

[application]
log_level = "info"
dry_run = false

[shopify]
shop_domain = "your-shop.myshopify.com"
api_version = "2024-01"
access_token = "${SHOPIFY_ACCESS_TOKEN}"

[bulk]
poll_interval_secs = 5
max_wait_secs = 3600

[sync]
entities = ["orders", "products", "customers", "collections", "product_metafields"]
mode = "incremental"
data_dir = "data"
output_format = "preserve"
include_shop_info = true

[state]
path = "data/state/sync_state.json"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# shopsync configuration
#
# Values of the form ${NAME} are replaced from the environment (and .env)
# before parsing. Any key can also be overridden with SHOPSYNC_<SECTION>_<KEY>,
# e.g. SHOPSYNC_SYNC_MODE=full.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
log_level = "info"

# Show the plan without calling Shopify
dry_run = false

# ============================================================================
# Shopify Admin API
# ============================================================================
[shopify]
# Shop domain; the GraphQL endpoint is derived from it
shop_domain = "your-shop.myshopify.com"

# Admin API version (YYYY-MM or "unstable")
api_version = "2024-01"

# Admin API access token (never logged)
access_token = "${SHOPIFY_ACCESS_TOKEN}"

# Full endpoint override, for proxies and tests
# endpoint = "http://localhost:8080/graphql.json"

# Per-request timeout
timeout_seconds = 60

# Retry of individual requests on network errors, 429 and 5xx
[shopify.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Bulk Operations
# ============================================================================
[bulk]
# Seconds between status polls
poll_interval_secs = 5

# A job still running after this long is abandoned
max_wait_secs = 3600

# Warn when the object count has not moved for this long
stall_warning_secs = 300

# ============================================================================
# Sync Cycle
# ============================================================================
[sync]
# Processed in this order; one at a time
# Available: orders, products, customers, collections, product_metafields,
# inventory_items
entities = ["orders", "products", "customers", "collections", "product_metafields"]

# incremental: only records updated since the last success (minus the overlap)
# full: everything, every run
mode = "incremental"

# Overlap subtracted from the last success time
incremental_overlap_minutes = 10

# Attempts for the extract unit (slot wait, submit, poll, download)
max_attempts = 3
retry_initial_delay_ms = 1000
retry_max_delay_ms = 60000

# raw/<entity>/<timestamp>.jsonl and processed/<entity>/<timestamp>.json
data_dir = "data"

# preserve: nested records as reconstructed
# flatten: nested objects become underscore-joined fields
output_format = "preserve"

# Save a snapshot of the shop profile with every run
include_shop_info = true

# Per-entity query overrides. Put {INCREMENTAL_FILTER} right after the
# connection name to receive the updated_at filter.
# [sync.queries]
# orders = """
# {
#   orders{INCREMENTAL_FILTER} {
#     edges { node { id name updatedAt } }
#   }
# }
# """

# ============================================================================
# Checkpoints
# ============================================================================
[state]
path = "data/state/sync_state.json"

# ============================================================================
# Upload
# ============================================================================
[upload]
# Copy processed files to <target_dir>/<prefix>/<entity>/YYYY/MM/DD/
enabled = false
# target_dir = "/mnt/exports"
prefix = "shopify"

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files in addition to the console
local_enabled = false
local_path = "logs"

# daily, hourly or never
local_rotation = "daily"
"#
        .to_string()
    }
}
