//! Domain identifier types with validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bulk operation identifier newtype wrapper
///
/// Shopify assigns global ids of the form `gid://shopify/BulkOperation/<n>`.
/// Only non-emptiness is enforced so that test doubles and future id schemes
/// are accepted.
///
/// # Examples
///
/// ```
/// use shopsync::domain::ids::JobId;
/// use std::str::FromStr;
///
/// let job_id = JobId::from_str("gid://shopify/BulkOperation/720918").unwrap();
/// assert_eq!(job_id.numeric_id(), Some(720918));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a new JobId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(JobId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Bulk job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Numeric tail of a `gid://` id, if it has one
    pub fn numeric_id(&self) -> Option<u64> {
        self.0.rsplit('/').next().and_then(|tail| tail.parse().ok())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_valid() {
        let id = JobId::new("gid://shopify/BulkOperation/1").unwrap();
        assert_eq!(id.as_str(), "gid://shopify/BulkOperation/1");
        assert_eq!(id.to_string(), "gid://shopify/BulkOperation/1");
    }

    #[test]
    fn test_job_id_empty() {
        assert!(JobId::new("").is_err());
        assert!(JobId::new("   ").is_err());
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(
            JobId::new("gid://shopify/BulkOperation/42").unwrap().numeric_id(),
            Some(42)
        );
        assert_eq!(JobId::new("job-abc").unwrap().numeric_id(), None);
    }

    #[test]
    fn test_job_id_serializes_as_plain_string() {
        let id = JobId::new("gid://shopify/BulkOperation/7").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/BulkOperation/7\"");
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
