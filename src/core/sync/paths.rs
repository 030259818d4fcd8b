//! Output file layout
//!
//! ```text
//! <data_dir>/raw/<entity>/<YYYYmmdd_HHMMSS>.jsonl
//! <data_dir>/processed/<entity>/<YYYYmmdd_HHMMSS>.json
//! ```

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Timestamp format used in every output file name
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    data_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Downloaded NDJSON artifact
    pub fn raw_path(&self, entity: &str, at: DateTime<Utc>) -> PathBuf {
        self.data_dir
            .join("raw")
            .join(entity)
            .join(format!("{}.jsonl", file_stamp(at)))
    }

    /// Reconstructed JSON document
    pub fn processed_path(&self, entity: &str, at: DateTime<Utc>) -> PathBuf {
        self.data_dir
            .join("processed")
            .join(entity)
            .join(format!("{}.json", file_stamp(at)))
    }
}

pub fn file_stamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Date-partitioned upload key: `<prefix>/<entity>/<YYYY/MM/DD>/<entity>_<stamp>.json`
///
/// An empty prefix is omitted.
pub fn upload_key(prefix: &str, entity: &str, at: DateTime<Utc>) -> String {
    let key = format!(
        "{entity}/{}/{entity}_{}.json",
        at.format("%Y/%m/%d"),
        file_stamp(at)
    );
    match prefix.trim_matches('/') {
        "" => key,
        prefix => format!("{prefix}/{key}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 5, 9).unwrap()
    }

    #[test]
    fn test_raw_and_processed_paths() {
        let layout = OutputLayout::new("data");
        assert_eq!(
            layout.raw_path("orders", at()),
            PathBuf::from("data/raw/orders/20240601_080509.jsonl")
        );
        assert_eq!(
            layout.processed_path("shop_info", at()),
            PathBuf::from("data/processed/shop_info/20240601_080509.json")
        );
    }

    #[test]
    fn test_upload_key() {
        assert_eq!(
            upload_key("shopify", "orders", at()),
            "shopify/orders/2024/06/01/orders_20240601_080509.json"
        );
        assert_eq!(
            upload_key("/exports/shopify/", "products", at()),
            "exports/shopify/products/2024/06/01/products_20240601_080509.json"
        );
        assert_eq!(
            upload_key("", "products", at()),
            "products/2024/06/01/products_20240601_080509.json"
        );
    }
}
