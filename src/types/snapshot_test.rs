//! Tests for snapshot types.

use serde_json::json;

use super::{EndSnapshot, NodeRecord, NodeSnapshot, Snapshot, SnapshotId, SnapshotStatus};

fn record() -> NodeRecord {
  NodeRecord {
    name: "WaitForName".to_string(),
    fields: json!({"user_name": {"$unset": true}}),
  }
}

#[test]
fn new_node_snapshot_is_created_and_prefixed() {
  let s = NodeSnapshot::new(record(), json!({"messages": []}));
  assert_eq!(s.status, SnapshotStatus::Created);
  assert!(s.id.as_str().starts_with("WaitForName:"));
  assert_eq!(s.id.as_str().len(), "WaitForName:".len() + 32);
  assert!(s.started_at.is_none());
  assert!(s.duration_ms.is_none());
}

#[test]
fn generated_ids_are_unique() {
  let a = SnapshotId::generate("n");
  let b = SnapshotId::generate("n");
  assert_ne!(a, b);
}

#[test]
fn transition_stamps_start_and_duration() {
  let mut s = NodeSnapshot::new(record(), json!(null));
  s.transition(SnapshotStatus::Running, None);
  assert_eq!(s.status, SnapshotStatus::Running);
  assert!(s.started_at.is_some());
  s.transition(SnapshotStatus::Success, Some(12));
  assert_eq!(s.status, SnapshotStatus::Success);
  assert_eq!(s.duration_ms, Some(12));
}

#[test]
fn status_display_is_snake_case() {
  assert_eq!(SnapshotStatus::Created.to_string(), "created");
  assert_eq!(SnapshotStatus::Running.to_string(), "running");
  assert_eq!(SnapshotStatus::Success.to_string(), "success");
  assert_eq!(SnapshotStatus::Error.to_string(), "error");
}

#[test]
fn snapshot_serializes_with_kind_tag() {
  let node = Snapshot::Node(NodeSnapshot::new(record(), json!({"k": 1})));
  let end = Snapshot::End(EndSnapshot::new(json!({"k": 2}), json!("done")));
  let node_json = serde_json::to_value(&node).unwrap();
  let end_json = serde_json::to_value(&end).unwrap();
  assert_eq!(node_json["kind"], "node");
  assert_eq!(node_json["status"], "created");
  assert_eq!(node_json["node"]["name"], "WaitForName");
  assert_eq!(end_json["kind"], "end");
  assert_eq!(end_json["output"], "done");
  assert!(end.id().as_str().starts_with("end:"));

  let back: Vec<Snapshot> = serde_json::from_value(json!([node_json, end_json])).unwrap();
  assert_eq!(back, vec![node.clone(), end]);
  assert_eq!(back[0].as_node().map(|n| n.node.name.as_str()), Some("WaitForName"));
  assert!(back[1].as_node().is_none());
}
