//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{parse_entity_list, ShopSyncConfig, SyncMode};
use super::secret_string;
use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ShopSyncConfig`]
/// 4. Applies environment variable overrides (`SHOPSYNC_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`SyncError::Configuration`] if any step fails.
///
/// # Examples
///
/// ```no_run
/// use shopsync::config::loader::load_config;
///
/// let config = load_config("shopsync.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ShopSyncConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ShopSyncConfig = toml::from_str(&contents)
        .map_err(|e| SyncError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SyncError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SyncError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut missing_vars: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            re.replace_all(line, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                })
            })
            .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        SyncError::Configuration(format!("Invalid value '{value}' for environment variable {name}"))
    })
}

/// Applies environment variable overrides using the `SHOPSYNC_` prefix
///
/// Variables follow the pattern `SHOPSYNC_<SECTION>_<KEY>`, for example
/// `SHOPSYNC_SHOPIFY_ACCESS_TOKEN` or `SHOPSYNC_SYNC_MODE`.
fn apply_env_overrides(config: &mut ShopSyncConfig) -> Result<()> {
    if let Some(val) = env_var("SHOPSYNC_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_var("SHOPSYNC_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_env("SHOPSYNC_APPLICATION_DRY_RUN", &val)?;
    }

    // Shopify
    if let Some(val) = env_var("SHOPSYNC_SHOPIFY_SHOP_DOMAIN") {
        config.shopify.shop_domain = val;
    }
    if let Some(val) = env_var("SHOPSYNC_SHOPIFY_API_VERSION") {
        config.shopify.api_version = val;
    }
    if let Some(val) = env_var("SHOPSYNC_SHOPIFY_ACCESS_TOKEN") {
        config.shopify.access_token = Some(secret_string(val));
    }
    if let Some(val) = env_var("SHOPSYNC_SHOPIFY_ENDPOINT") {
        config.shopify.endpoint = Some(val);
    }
    if let Some(val) = env_var("SHOPSYNC_SHOPIFY_TIMEOUT_SECONDS") {
        config.shopify.timeout_seconds = parse_env("SHOPSYNC_SHOPIFY_TIMEOUT_SECONDS", &val)?;
    }

    // Bulk polling
    if let Some(val) = env_var("SHOPSYNC_BULK_POLL_INTERVAL_SECS") {
        config.bulk.poll_interval_secs = parse_env("SHOPSYNC_BULK_POLL_INTERVAL_SECS", &val)?;
    }
    if let Some(val) = env_var("SHOPSYNC_BULK_MAX_WAIT_SECS") {
        config.bulk.max_wait_secs = parse_env("SHOPSYNC_BULK_MAX_WAIT_SECS", &val)?;
    }
    if let Some(val) = env_var("SHOPSYNC_BULK_STALL_WARNING_SECS") {
        config.bulk.stall_warning_secs = parse_env("SHOPSYNC_BULK_STALL_WARNING_SECS", &val)?;
    }

    // Sync
    if let Some(val) = env_var("SHOPSYNC_SYNC_ENTITIES") {
        config.sync.entities = parse_entity_list(val.split(',')).map_err(SyncError::Configuration)?;
    }
    if let Some(val) = env_var("SHOPSYNC_SYNC_MODE") {
        config.sync.mode = SyncMode::from_str(&val).map_err(SyncError::Configuration)?;
    }
    if let Some(val) = env_var("SHOPSYNC_SYNC_MAX_ATTEMPTS") {
        config.sync.max_attempts = parse_env("SHOPSYNC_SYNC_MAX_ATTEMPTS", &val)?;
    }
    if let Some(val) = env_var("SHOPSYNC_SYNC_DATA_DIR") {
        config.sync.data_dir = PathBuf::from(val);
    }
    if let Some(val) = env_var("SHOPSYNC_SYNC_OUTPUT_FORMAT") {
        config.sync.output_format = parse_env("SHOPSYNC_SYNC_OUTPUT_FORMAT", &val)?;
    }
    if let Some(val) = env_var("SHOPSYNC_SYNC_INCLUDE_SHOP_INFO") {
        config.sync.include_shop_info = parse_env("SHOPSYNC_SYNC_INCLUDE_SHOP_INFO", &val)?;
    }

    if let Some(val) = env_var("SHOPSYNC_STATE_PATH") {
        config.state.path = PathBuf::from(val);
    }

    // Upload
    if let Some(val) = env_var("SHOPSYNC_UPLOAD_ENABLED") {
        config.upload.enabled = parse_env("SHOPSYNC_UPLOAD_ENABLED", &val)?;
    }
    if let Some(val) = env_var("SHOPSYNC_UPLOAD_TARGET_DIR") {
        config.upload.target_dir = Some(PathBuf::from(val));
    }
    if let Some(val) = env_var("SHOPSYNC_UPLOAD_PREFIX") {
        config.upload.prefix = val;
    }

    // Logging
    if let Some(val) = env_var("SHOPSYNC_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("SHOPSYNC_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_var("SHOPSYNC_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_var("SHOPSYNC_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
