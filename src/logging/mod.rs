//! Logging and observability
//!
//! Structured logging through `tracing`, with an optional rolling JSON file
//! and a few macros that keep field names consistent across components.
//!
//! # Example
//!
//! ```no_run
//! use shopsync::logging::init_logging;
//! use shopsync::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(entity = "orders", "Sync started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use shopsync::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 400u64, "connection reset");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log the completion of one entity's sync cycle
///
/// # Example
///
/// ```no_run
/// use shopsync::log_entity_complete;
/// use std::time::Duration;
///
/// log_entity_complete!("orders", 1520usize, 3usize, Duration::from_secs(42));
/// ```
#[macro_export]
macro_rules! log_entity_complete {
    ($entity:expr, $records:expr, $dropped:expr, $duration:expr) => {
        tracing::info!(
            entity = %$entity,
            records = $records,
            dropped = $dropped,
            duration_ms = $duration.as_millis() as u64,
            "Entity sync completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use shopsync::log_error_with_context;
/// use shopsync::domain::SyncError;
///
/// let error = SyncError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
