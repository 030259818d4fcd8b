//! Result type alias for shopsync

use super::errors::SyncError;

/// Result type alias for shopsync operations
///
/// # Examples
///
/// ```
/// use shopsync::domain::result::Result;
/// use shopsync::domain::errors::SyncError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(SyncError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SyncError>;
