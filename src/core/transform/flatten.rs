//! Flatten mode
//!
//! Nested objects are collapsed into underscore-joined keys:
//! - `{"customer": {"email": "x"}}` → `{"customer_email": "x"}`
//! - `{"totalPriceSet": {"shopMoney": {"amount": "1"}}}` → `{"totalPriceSet_shopMoney_amount": "1"}`
//!
//! Child collections produced by reconstruction stay arrays, and each of
//! their items is flattened under its own role. Other arrays are kept as is.

use crate::core::reconstruct::rules::Role;
use crate::core::reconstruct::tree::PARENT_ID_FIELD;
use crate::domain::EntityKind;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Field stamped on every flattened root
pub const PROCESSED_AT_FIELD: &str = "processed_at";

/// Flatten one reconstructed root and stamp `processed_at`
pub fn flatten_root(kind: EntityKind, root: Value, processed_at: DateTime<Utc>) -> Value {
    let mut flattened = flatten_value(Role::root_of(kind), root);
    if let Value::Object(map) = &mut flattened {
        map.insert(
            PROCESSED_AT_FIELD.to_string(),
            Value::String(processed_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }
    flattened
}

fn flatten_value(role: Role, value: Value) -> Value {
    match value {
        Value::Object(record) => Value::Object(flatten_record(role, record)),
        other => other,
    }
}

fn flatten_record(role: Role, record: Map<String, Value>) -> Map<String, Value> {
    let rules = role.child_rules();
    let mut out = Map::new();
    let mut nested_objects = Vec::new();

    for (key, value) in record {
        if key == PARENT_ID_FIELD {
            continue;
        }

        let child_role = rules
            .iter()
            .find(|r| r.collection == key)
            .map(|r| r.role);

        match (child_role, value) {
            (Some(child_role), Value::Array(items)) => {
                let items = items
                    .into_iter()
                    .map(|item| flatten_value(child_role, item))
                    .collect();
                out.insert(key, Value::Array(items));
            }
            (_, Value::Object(nested)) => nested_objects.push((key, nested)),
            (_, value) => {
                out.insert(key, value);
            }
        }
    }

    // Literal keys are all in place before any collapsed key is written
    for (key, nested) in nested_objects {
        collapse_into(&mut out, &key, nested);
    }

    out
}

/// Write `nested` into `out` under `prefix_*` keys; an existing key wins
fn collapse_into(out: &mut Map<String, Value>, prefix: &str, nested: Map<String, Value>) {
    if nested.is_empty() {
        out.entry(prefix.to_string()).or_insert(Value::Null);
        return;
    }
    for (key, value) in nested {
        let path = format!("{prefix}_{key}");
        match value {
            Value::Object(inner) => collapse_into(out, &path, inner),
            value => {
                out.entry(path).or_insert(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_nested_objects_collapse() {
        let root = json!({
            "id": "O1",
            "customer": {"email": "a@b.c", "defaultAddress": {"city": "Oslo"}},
            "totalPriceSet": {"shopMoney": {"amount": "10.00", "currencyCode": "NOK"}},
            "tags": ["vip", "wholesale"]
        });

        let out = flatten_root(EntityKind::Orders, root, stamp());

        assert_eq!(out["customer_email"], "a@b.c");
        assert_eq!(out["customer_defaultAddress_city"], "Oslo");
        assert_eq!(out["totalPriceSet_shopMoney_amount"], "10.00");
        assert_eq!(out["tags"], json!(["vip", "wholesale"]));
        assert_eq!(out["processed_at"], "2024-06-01T08:00:00Z");
        assert!(out.get("customer").is_none());
    }

    #[test]
    fn test_child_collections_are_flattened_recursively() {
        let root = json!({
            "id": "O1",
            "lineItems": [
                {"id": "L1", "variant": {"id": "V1", "sku": "HAT"}, "__parentId": "O1"}
            ],
            "refunds": [
                {
                    "id": "R1",
                    "__parentId": "O1",
                    "refundLineItems": [],
                    "transactions": [
                        {"id": "T1", "amountSet": {"shopMoney": {"amount": "5.00"}}, "__parentId": "R1"}
                    ]
                }
            ]
        });

        let out = flatten_root(EntityKind::Orders, root, stamp());

        let line = &out["lineItems"][0];
        assert_eq!(line["variant_sku"], "HAT");
        assert!(line.get("__parentId").is_none());

        let txn = &out["refunds"][0]["transactions"][0];
        assert_eq!(txn["amountSet_shopMoney_amount"], "5.00");
        assert!(txn.get("__parentId").is_none());
        assert_eq!(out["refunds"][0]["refundLineItems"], json!([]));
    }

    #[test]
    fn test_existing_key_is_not_overwritten() {
        let root = json!({"id": "P1", "seo_title": "explicit", "seo": {"title": "nested"}});
        let out = flatten_root(EntityKind::Products, root, stamp());
        assert_eq!(out["seo_title"], "explicit");
    }

    #[test]
    fn test_literal_key_wins_whatever_the_key_order() {
        // Both nested keys sort ahead of the literal keys they collide with
        let root = json!({
            "id": "O1",
            "customer": {"email": "nested@example.com", "id": "C1"},
            "customer_email": "literal@example.com",
            "shipping": {"zip": "0150"},
            "shipping_zip": null
        });

        let out = flatten_root(EntityKind::Orders, root, stamp());

        assert_eq!(out["customer_email"], "literal@example.com");
        assert_eq!(out["customer_id"], "C1");
        assert_eq!(out.get("shipping_zip"), Some(&Value::Null));
    }

    #[test]
    fn test_empty_object_becomes_null() {
        let root = json!({"id": "C1", "image": {}});
        let out = flatten_root(EntityKind::Collections, root, stamp());
        assert_eq!(out["image"], Value::Null);
    }
}
