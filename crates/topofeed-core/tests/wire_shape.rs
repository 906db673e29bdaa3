//! Wire-shape tests for node deltas
//!
//! The upstream source sends `null` or omits a bucket when it is empty;
//! both must decode to an absent bucket.

use serde_json::json;
use topofeed_core::{Consolidate, Node, NodeId, NodesDelta};

#[test]
fn test_decode_full_delta() {
    let raw = json!({
        "add": [{"id": "host-1", "label": "web", "rank": 3}],
        "update": [{"id": "host-2", "label": "db"}],
        "remove": ["host-3"]
    });

    let delta: NodesDelta = serde_json::from_value(raw).unwrap();
    assert_eq!(delta.counts(), (1, 1, 1));
    assert_eq!(delta.added()[0].id, NodeId::from("host-1"));
    assert_eq!(delta.added()[0].attr("rank"), Some(&json!(3)));
    assert_eq!(delta.removed(), &[NodeId::from("host-3")]);
}

#[test]
fn test_decode_null_and_missing_buckets() {
    let nulls: NodesDelta =
        serde_json::from_value(json!({"add": null, "update": null, "remove": null})).unwrap();
    assert!(nulls.is_degenerate());

    let missing: NodesDelta = serde_json::from_value(json!({"remove": ["a"]})).unwrap();
    assert!(missing.add.is_none());
    assert!(missing.update.is_none());
    assert!(!missing.is_degenerate());
}

#[test]
fn test_encode_absent_bucket_as_null() {
    let delta = NodesDelta::new().with_add(vec![Node::new("a").with_attr("shape", "circle")]);
    let value = serde_json::to_value(&delta).unwrap();

    assert_eq!(value["add"][0]["id"], json!("a"));
    assert_eq!(value["add"][0]["shape"], json!("circle"));
    assert!(value["update"].is_null());
    assert!(value["remove"].is_null());
}

#[test]
fn test_payload_survives_consolidation() {
    let older: NodesDelta = serde_json::from_value(json!({
        "add": [{"id": "a", "metrics": {"cpu": 0.1}}]
    }))
    .unwrap();
    let newer: NodesDelta = serde_json::from_value(json!({
        "update": [{"id": "a", "metrics": {"cpu": 0.9}}]
    }))
    .unwrap();

    let merged = older.consolidate(&newer);
    let value = serde_json::to_value(&merged).unwrap();
    assert_eq!(value["add"][0]["metrics"]["cpu"], json!(0.9));
    assert!(value["update"].is_null());
}
