//! Output shaping for reconstructed records
//!
//! - **Preserve**: records are written exactly as reconstructed
//! - **Flatten**: nested single objects become `parent_child` fields

pub mod flatten;

use crate::domain::{EntityKind, Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Shape of the processed JSON document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Keep the reconstructed structure
    #[default]
    Preserve,
    /// Collapse nested objects into underscore-joined fields
    Flatten,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Preserve => "preserve",
            OutputFormat::Flatten => "flatten",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "preserve" | "preserved" => Ok(Self::Preserve),
            "flatten" | "flattened" => Ok(Self::Flatten),
            _ => Err(SyncError::Configuration(format!(
                "Invalid output format: {s}. Expected 'preserve' or 'flatten'"
            ))),
        }
    }
}

/// Shape reconstructed roots of `kind` for writing
pub fn transform_records(
    kind: EntityKind,
    roots: Vec<Value>,
    format: OutputFormat,
    processed_at: DateTime<Utc>,
) -> Vec<Value> {
    match format {
        OutputFormat::Preserve => roots,
        OutputFormat::Flatten => roots
            .into_iter()
            .map(|root| flatten::flatten_root(kind, root, processed_at))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("preserve", OutputFormat::Preserve)]
    #[test_case("Preserved", OutputFormat::Preserve)]
    #[test_case("flatten", OutputFormat::Flatten)]
    #[test_case(" FLATTENED ", OutputFormat::Flatten)]
    fn test_output_format_from_str(input: &str, expected: OutputFormat) {
        assert_eq!(OutputFormat::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_output_format_rejects_unknown() {
        let err = OutputFormat::from_str("csv").unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[test]
    fn test_output_format_serde() {
        assert_eq!(OutputFormat::default(), OutputFormat::Preserve);
        let parsed: OutputFormat = serde_json::from_value(json!("flatten")).unwrap();
        assert_eq!(parsed, OutputFormat::Flatten);
        assert_eq!(serde_json::to_value(OutputFormat::Preserve).unwrap(), json!("preserve"));
    }

    #[test]
    fn test_preserve_is_identity() {
        let roots = vec![json!({"id": "O1", "customer": {"email": "a@b.c"}, "lineItems": []})];
        let out = transform_records(
            EntityKind::Orders,
            roots.clone(),
            OutputFormat::Preserve,
            Utc::now(),
        );
        assert_eq!(out, roots);
    }
}
