//! Configuration schema types
//!
//! Each section is a plain serde struct with per-field defaults and a
//! `validate` method returning a human-readable message. Entity names and
//! enumerated settings are resolved to typed values at deserialization time.

use crate::config::SecretString;
use crate::core::transform::OutputFormat;
use crate::domain::EntityKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration mapped from `shopsync.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSyncConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Shopify Admin API connection
    pub shopify: ShopifyConfig,

    /// Bulk operation polling
    #[serde(default)]
    pub bulk: BulkConfig,

    /// Entity selection and the sync cycle
    #[serde(default)]
    pub sync: SyncConfig,

    /// Checkpoint persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Optional copy of processed output to an upload target
    #[serde(default)]
    pub upload: UploadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ShopSyncConfig {
    /// Validates every section
    ///
    /// # Errors
    ///
    /// Returns the first validation message encountered
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.shopify.validate()?;
        self.bulk.validate()?;
        self.sync.validate()?;
        self.state.validate()?;
        self.upload.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Show the plan without contacting Shopify
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Transport retry policy for GraphQL requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based), capped at `max_delay_ms`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        backoff_delay(
            self.initial_delay_ms,
            self.backoff_multiplier,
            self.max_delay_ms,
            attempt,
        )
    }

    fn validate(&self) -> Result<(), String> {
        if self.backoff_multiplier < 1.0 {
            return Err("shopify.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(
                "shopify.retry.initial_delay_ms must not exceed max_delay_ms".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Exponential backoff: `initial * multiplier^(attempt - 1)`, capped
pub(crate) fn backoff_delay(
    initial_delay_ms: u64,
    multiplier: f64,
    max_delay_ms: u64,
    attempt: u32,
) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let delay_ms = (initial_delay_ms as f64 * multiplier.powi(exponent)).min(max_delay_ms as f64);
    Duration::from_millis(delay_ms as u64)
}

/// Shopify Admin API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyConfig {
    /// Store domain, e.g. `my-store.myshopify.com`
    #[serde(default)]
    pub shop_domain: String,

    /// Admin API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Admin API access token
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Full GraphQL endpoint, overriding the one derived from `shop_domain`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Transport retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ShopifyConfig {
    /// GraphQL endpoint URL
    pub fn graphql_endpoint(&self) -> String {
        if let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.is_empty()) {
            return endpoint.to_string();
        }
        let domain = self
            .shop_domain
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        format!(
            "https://{}/admin/api/{}/graphql.json",
            domain, self.api_version
        )
    }

    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        match self.endpoint.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => {
                let parsed = url::Url::parse(endpoint)
                    .map_err(|e| format!("shopify.endpoint is not a valid URL: {e}"))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err("shopify.endpoint must start with http:// or https://".to_string());
                }
            }
            _ => {
                if self.shop_domain.trim().is_empty() {
                    return Err(
                        "shopify.shop_domain cannot be empty unless shopify.endpoint is set"
                            .to_string(),
                    );
                }
            }
        }

        if self.api_version != "unstable" && !is_api_version(&self.api_version) {
            return Err(format!(
                "Invalid shopify.api_version '{}'. Expected YYYY-MM or 'unstable'",
                self.api_version
            ));
        }

        let token_missing = self
            .access_token
            .as_ref()
            .map(|t| t.expose_secret().is_empty())
            .unwrap_or(true);
        if token_missing {
            return Err("shopify.access_token cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("shopify.timeout_seconds must be > 0".to_string());
        }

        self.retry.validate()?;
        Ok(())
    }
}

fn is_api_version(value: &str) -> bool {
    let mut parts = value.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), None) => {
            year.len() == 4
                && month.len() == 2
                && year.chars().all(|c| c.is_ascii_digit())
                && month.parse::<u8>().map(|m| (1..=12).contains(&m)).unwrap_or(false)
        }
        _ => false,
    }
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            shop_domain: String::new(),
            api_version: default_api_version(),
            access_token: None,
            endpoint: None,
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

/// Bulk operation polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Seconds between status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Wall-clock ceiling for one job
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Warn when the object count has not moved for this long
    #[serde(default = "default_stall_warning_secs")]
    pub stall_warning_secs: u64,
}

impl BulkConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn stall_warning(&self) -> Duration {
        Duration::from_secs(self.stall_warning_secs)
    }

    fn validate(&self) -> Result<(), String> {
        if self.poll_interval_secs == 0 {
            return Err("bulk.poll_interval_secs must be > 0".to_string());
        }
        if self.max_wait_secs < self.poll_interval_secs {
            return Err("bulk.max_wait_secs must be >= bulk.poll_interval_secs".to_string());
        }
        if self.stall_warning_secs == 0 {
            return Err("bulk.stall_warning_secs must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
            stall_warning_secs: default_stall_warning_secs(),
        }
    }
}

/// Extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Only records updated since the last successful sync
    #[default]
    Incremental,
    /// Everything, ignoring checkpoints
    Full,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Incremental => write!(f, "incremental"),
            SyncMode::Full => write!(f, "full"),
        }
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "incremental" => Ok(SyncMode::Incremental),
            "full" => Ok(SyncMode::Full),
            other => Err(format!(
                "Invalid sync mode '{other}'. Must be one of: incremental, full"
            )),
        }
    }
}

/// Sync cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Entities to extract, in processing order
    #[serde(
        default = "default_entities",
        deserialize_with = "deserialize_entities"
    )]
    pub entities: Vec<EntityKind>,

    /// Incremental or full extraction
    #[serde(default)]
    pub mode: SyncMode,

    /// Minutes subtracted from the last success to form the lower bound
    #[serde(default = "default_incremental_overlap_minutes")]
    pub incremental_overlap_minutes: i64,

    /// Attempts for the extract unit of one entity
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First delay between extract attempts
    #[serde(default = "default_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Delay ceiling between extract attempts
    #[serde(default = "default_sync_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Root directory for raw and processed output
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Shape of processed records
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Query text overrides keyed by entity
    #[serde(default, deserialize_with = "deserialize_queries")]
    pub queries: BTreeMap<EntityKind, String>,

    /// Also snapshot the shop profile once per run
    #[serde(default)]
    pub include_shop_info: bool,
}

impl SyncConfig {
    /// Delay before extract retry number `attempt` (1-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        backoff_delay(
            self.retry_initial_delay_ms,
            2.0,
            self.retry_max_delay_ms,
            attempt,
        )
    }

    fn validate(&self) -> Result<(), String> {
        if self.entities.is_empty() {
            return Err("sync.entities cannot be empty".to_string());
        }
        for (i, kind) in self.entities.iter().enumerate() {
            if self.entities[..i].contains(kind) {
                return Err(format!("sync.entities lists '{kind}' more than once"));
            }
        }
        if self.incremental_overlap_minutes < 0 {
            return Err("sync.incremental_overlap_minutes must be >= 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("sync.max_attempts must be > 0".to_string());
        }
        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(
                "sync.retry_initial_delay_ms must not exceed sync.retry_max_delay_ms".to_string(),
            );
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err("sync.data_dir cannot be empty".to_string());
        }
        for (kind, query) in &self.queries {
            if query.trim().is_empty() {
                return Err(format!("sync.queries.{kind} cannot be empty"));
            }
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            entities: default_entities(),
            mode: SyncMode::default(),
            incremental_overlap_minutes: default_incremental_overlap_minutes(),
            max_attempts: default_max_attempts(),
            retry_initial_delay_ms: default_initial_delay_ms(),
            retry_max_delay_ms: default_sync_max_delay_ms(),
            data_dir: default_data_dir(),
            output_format: OutputFormat::default(),
            queries: BTreeMap::new(),
            include_shop_info: false,
        }
    }
}

/// Parse a list of entity names, accepting the same spellings as the CLI
pub fn parse_entity_list<I, S>(names: I) -> Result<Vec<EntityKind>, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter(|name| !name.as_ref().trim().is_empty())
        .map(|name| EntityKind::from_str(name.as_ref()).map_err(|e| e.to_string()))
        .collect()
}

fn deserialize_entities<'de, D>(deserializer: D) -> Result<Vec<EntityKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    parse_entity_list(names).map_err(serde::de::Error::custom)
}

fn deserialize_queries<'de, D>(deserializer: D) -> Result<BTreeMap<EntityKind, String>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, String>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, query)| {
            EntityKind::from_str(&name)
                .map(|kind| (kind, query))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

/// Checkpoint persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// JSON file holding every entity's checkpoint
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("state.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

/// Upload of processed output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Root directory of the mirror
    #[serde(default)]
    pub target_dir: Option<PathBuf>,

    /// Key prefix under the target
    #[serde(default = "default_upload_prefix")]
    pub prefix: String,
}

impl UploadConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.target_dir.is_none() {
            return Err("upload.target_dir is required when upload.enabled = true".to_string());
        }
        if self.prefix.contains("..") {
            return Err("upload.prefix must not contain '..'".to_string());
        }
        Ok(())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_dir: None,
            prefix: default_upload_prefix(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a rolling file
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_version() -> String {
    "2024-01".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_sync_max_delay_ms() -> u64 {
    60000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_wait_secs() -> u64 {
    3600
}

fn default_stall_warning_secs() -> u64 {
    300
}

fn default_entities() -> Vec<EntityKind> {
    vec![
        EntityKind::Orders,
        EntityKind::Products,
        EntityKind::Customers,
        EntityKind::Collections,
        EntityKind::ProductMetafields,
    ]
}

fn default_incremental_overlap_minutes() -> i64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_state_path() -> PathBuf {
    PathBuf::from("data/state/sync_state.json")
}

fn default_upload_prefix() -> String {
    "shopify".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
