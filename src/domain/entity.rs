//! Supported entity kinds
//!
//! The set of exportable entities is closed. Configuration refers to them by
//! name, and names are resolved to an [`EntityKind`] once during config
//! validation; every later stage works on the enum.

use super::errors::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entities that can be extracted through a bulk operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Orders,
    Products,
    Customers,
    Collections,
    ProductMetafields,
    InventoryItems,
}

impl EntityKind {
    /// All entity kinds in their default processing order
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Orders,
        EntityKind::Products,
        EntityKind::Customers,
        EntityKind::Collections,
        EntityKind::ProductMetafields,
        EntityKind::InventoryItems,
    ];

    /// Name used in configuration, file paths and checkpoints
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Orders => "orders",
            EntityKind::Products => "products",
            EntityKind::Customers => "customers",
            EntityKind::Collections => "collections",
            EntityKind::ProductMetafields => "product_metafields",
            EntityKind::InventoryItems => "inventory_items",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = EntityKind::ALL.iter().map(|k| k.as_str()).collect();
                SyncError::Configuration(format!(
                    "Unknown entity '{s}'. Supported entities: {}",
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_round_trip_names() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_entity_name_normalization() {
        assert_eq!(
            EntityKind::from_str("Product-Metafields").unwrap(),
            EntityKind::ProductMetafields
        );
        assert_eq!(EntityKind::from_str(" orders ").unwrap(), EntityKind::Orders);
    }

    #[test]
    fn test_unknown_entity() {
        let err = EntityKind::from_str("shop_info").unwrap_err();
        assert!(err.to_string().contains("Unknown entity 'shop_info'"));
        assert!(err.to_string().contains("inventory_items"));
    }
}
