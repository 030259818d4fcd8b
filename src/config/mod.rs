//! Configuration management for shopsync.
//!
//! shopsync reads a TOML file (default `shopsync.toml`) with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SHOPSYNC_<SECTION>_<KEY>` overrides applied after parsing
//! - Default values for every optional setting
//! - Per-section validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shopsync::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("shopsync.toml")?;
//! println!("Endpoint: {}", config.shopify.graphql_endpoint());
//! println!("Entities: {:?}", config.sync.entities);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [shopify]
//! shop_domain = "my-store.myshopify.com"
//! access_token = "${SHOPIFY_ACCESS_TOKEN}"
//!
//! [bulk]
//! poll_interval_secs = 5
//! max_wait_secs = 3600
//!
//! [sync]
//! entities = ["orders", "products", "customers"]
//! mode = "incremental"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, BulkConfig, LoggingConfig, RetryConfig, ShopSyncConfig, ShopifyConfig,
    StateConfig, SyncConfig, SyncMode, UploadConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
