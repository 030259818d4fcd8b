//! Integration tests for rebuilding nested records from bulk export files

use serde_json::{json, Value};
use shopsync::core::download::verify_ndjson;
use shopsync::core::reconstruct::reconstruct_file;
use shopsync::core::transform::{transform_records, OutputFormat};
use shopsync::domain::EntityKind;
use std::io::Write;
use tempfile::NamedTempFile;

fn artifact(lines: &[Value]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", serde_json::to_string(line).unwrap()).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_products_rebuild_three_levels() {
    let file = artifact(&[
        json!({"id": "P1", "title": "Hat"}),
        json!({"id": "V1", "sku": "HAT-1", "__parentId": "P1"}),
        json!({"id": "L1", "available": 4, "__parentId": "V1"}),
        json!({"id": "P2", "title": "Scarf"}),
    ]);

    verify_ndjson(file.path()).unwrap();
    let result = reconstruct_file(EntityKind::Products, file.path()).unwrap();

    assert_eq!(result.roots.len(), 2);
    assert_eq!(result.stats.roots, 2);
    assert_eq!(result.stats.attached, 2);
    assert_eq!(result.stats.dropped, 0);

    let hat = &result.roots[0];
    assert_eq!(hat["title"], "Hat");
    assert_eq!(hat["variants"][0]["sku"], "HAT-1");
    assert_eq!(hat["variants"][0]["inventoryLevels"][0]["available"], 4);
    assert_eq!(result.roots[1]["variants"], json!([]));
}

#[test]
fn test_orders_children_are_classified_and_ordered() {
    let file = artifact(&[
        json!({"id": "O1", "name": "#1001"}),
        json!({"id": "LI1", "variant": {"id": "V1"}, "__parentId": "O1"}),
        json!({"id": "R1", "refundLineItems": {}, "__parentId": "O1"}),
        json!({"id": "LI2", "product": {"id": "P1"}, "__parentId": "O1"}),
        json!({"id": "T1", "amountSet": {"shopMoney": {"amount": "5.00"}}, "__parentId": "R1"}),
        json!({"id": "RLI1", "lineItem": {"id": "LI1"}, "__parentId": "R1"}),
    ]);

    let result = reconstruct_file(EntityKind::Orders, file.path()).unwrap();
    let order = &result.roots[0];

    let line_ids: Vec<&str> = order["lineItems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(line_ids, vec!["LI1", "LI2"]);
    assert_eq!(order["refunds"][0]["transactions"][0]["id"], "T1");
    assert_eq!(order["refunds"][0]["refundLineItems"][0]["id"], "RLI1");
    assert_eq!(result.stats.total(), 6);
}

#[test]
fn test_inline_refunds_from_default_orders_query_are_kept() {
    let file = artifact(&[
        json!({
            "id": "O1",
            "refunds": [{"id": "R1", "note": "damaged", "totalRefundedSet": {"shopMoney": {"amount": "5.00"}}}]
        }),
        json!({"id": "LI1", "variant": {"id": "V1"}, "__parentId": "O1"}),
        json!({"id": "O2", "refunds": []}),
    ]);

    let result = reconstruct_file(EntityKind::Orders, file.path()).unwrap();

    assert_eq!(result.stats.dropped, 0);
    assert_eq!(result.stats.attached, 1);
    let order = &result.roots[0];
    assert_eq!(order["refunds"].as_array().unwrap().len(), 1);
    assert_eq!(order["refunds"][0]["note"], "damaged");
    assert_eq!(order["lineItems"][0]["id"], "LI1");
    assert_eq!(result.roots[1]["refunds"], json!([]));

    let flat = transform_records(
        EntityKind::Orders,
        result.roots,
        OutputFormat::Flatten,
        chrono::Utc::now(),
    );
    assert_eq!(flat[0]["refunds"][0]["totalRefundedSet_shopMoney_amount"], "5.00");
}

#[test]
fn test_orphans_are_dropped_and_counted() {
    let file = artifact(&[
        json!({"id": "C1", "email": "a@example.com"}),
        json!({"id": "A1", "city": "Oslo", "__parentId": "C1"}),
        json!({"id": "A2", "city": "Bergen", "__parentId": "C404"}),
        json!({"id": "X1", "unrelated": true, "__parentId": "C1"}),
    ]);

    let result = reconstruct_file(EntityKind::Customers, file.path()).unwrap();

    assert_eq!(result.stats.dropped, 2);
    assert_eq!(result.stats.roots + result.stats.attached, 4 - result.stats.dropped);
    assert_eq!(result.roots[0]["addresses"].as_array().unwrap().len(), 1);
    assert_eq!(result.roots[0]["metafields"], json!([]));
}

#[test]
fn test_flattened_output_from_file() {
    let file = artifact(&[
        json!({"id": "P1", "seo": {"title": "Hat"}}),
        json!({"id": "M1", "namespace": "custom", "key": "fit", "__parentId": "P1"}),
    ]);

    let result = reconstruct_file(EntityKind::ProductMetafields, file.path()).unwrap();
    let processed_at = chrono::Utc::now();
    let records = transform_records(
        EntityKind::ProductMetafields,
        result.roots,
        OutputFormat::Flatten,
        processed_at,
    );

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["seo_title"], "Hat");
    assert_eq!(records[0]["metafields"][0]["key"], "fit");
    assert!(records[0]["metafields"][0].get("__parentId").is_none());
    assert!(records[0]["processed_at"].is_string());
}

#[test]
fn test_truncated_artifact_is_rejected_by_verification() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{\"id\":\"P1\"}}\n{{\"id\":\"V1\",\"__pare").unwrap();
    file.flush().unwrap();

    assert!(verify_ndjson(file.path()).is_err());
}
