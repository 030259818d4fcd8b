//! Domain error types
//!
//! This module defines the error hierarchy for shopsync. Errors are grouped by
//! the stage that produced them so the orchestration loop can decide, per
//! variant, whether a failed extract unit may be retried.
//! Third-party error types are never exposed; they are flattened to strings at
//! the adapter boundary.

use thiserror::Error;

/// Main shopsync error type
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote service rejected the bulk query (userErrors on submission)
    #[error("User input error: {0}")]
    UserInput(String),

    /// Network failure, 5xx or throttling that outlived the client retry budget
    #[error("Transport error: {0}")]
    Transport(String),

    /// GraphQL-level errors or an unexpected response shape
    #[error("API error: {0}")]
    Api(String),

    /// Access token rejected (401/403)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A bulk job reached a terminal state without usable data
    #[error("Bulk job {job_id} ended with status {status}{}", format_error_code(.error_code))]
    RemoteJob {
        job_id: String,
        status: String,
        error_code: Option<String>,
    },

    /// Downloaded artifact failed the integrity check
    #[error("Verification error: {0}")]
    Verification(String),

    /// Polling exceeded the wall-clock ceiling
    #[error("Bulk job {job_id} timed out after {elapsed_secs}s")]
    TimedOut { job_id: String, elapsed_secs: u64 },

    /// The artifact could not be read back into records
    #[error("Reconstruction error: {0}")]
    Reconstruction(String),

    /// Checkpoint store errors
    #[error("State management error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

fn format_error_code(code: &Option<String>) -> String {
    match code {
        Some(code) => format!(" ({code})"),
        None => String::new(),
    }
}

impl SyncError {
    /// Whether a failed extract unit may be attempted again
    ///
    /// Faults in the query, the artifact or the local machine will not go away
    /// on a second attempt; network and remote-job faults might.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::Api(_) | SyncError::RemoteJob { .. }
        )
    }

    /// Short machine-friendly name of the error kind, used in summaries
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "configuration",
            SyncError::UserInput(_) => "user_input",
            SyncError::Transport(_) => "transport",
            SyncError::Api(_) => "api",
            SyncError::Authentication(_) => "authentication",
            SyncError::RemoteJob { .. } => "remote_job",
            SyncError::Verification(_) => "verification",
            SyncError::TimedOut { .. } => "timed_out",
            SyncError::Reconstruction(_) => "reconstruction",
            SyncError::State(_) => "state",
            SyncError::Serialization(_) => "serialization",
            SyncError::Io(_) => "io",
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}
