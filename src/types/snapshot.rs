//! Snapshots persisted between steps of a graph run.
//!
//! Layout: node type tag + node field values, run state, identity token. Node and
//! state are stored as JSON so any backend can hold them without knowing the graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identity token of a snapshot: `<node name>:<32 hex>`.
///
/// The prefix names the node the snapshot was first written for. An id never changes,
/// so a snapshot whose node is later replaced by a resume override keeps its prefix;
/// read [NodeRecord::name] for the node it currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
  /// Generates a fresh id prefixed with `prefix` (usually the node name).
  pub fn generate(prefix: &str) -> Self {
    Self(format!("{}:{}", prefix, Uuid::new_v4().simple()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for SnapshotId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for SnapshotId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

/// Lifecycle of a node snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
  /// Written, its node has not started.
  Created,
  /// Its node's transition is executing.
  Running,
  Success,
  Error,
}

impl fmt::Display for SnapshotStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SnapshotStatus::Created => write!(f, "created"),
      SnapshotStatus::Running => write!(f, "running"),
      SnapshotStatus::Success => write!(f, "success"),
      SnapshotStatus::Error => write!(f, "error"),
    }
  }
}

/// Type tag plus serialized field values of one node instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
  pub name: String,
  pub fields: Value,
}

/// Snapshot naming the next node to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
  pub id: SnapshotId,
  pub node: NodeRecord,
  pub state: Value,
  pub status: SnapshotStatus,
  /// Set when the node starts running.
  pub started_at: Option<DateTime<Utc>>,
  /// Wall time of the node's transition, once finished.
  pub duration_ms: Option<u64>,
}

impl NodeSnapshot {
  pub fn new(node: NodeRecord, state: Value) -> Self {
    Self {
      id: SnapshotId::generate(&node.name),
      node,
      state,
      status: SnapshotStatus::Created,
      started_at: None,
      duration_ms: None,
    }
  }

  /// Moves the snapshot to `status`, stamping start time or duration as appropriate.
  pub fn transition(&mut self, status: SnapshotStatus, duration_ms: Option<u64>) {
    if status == SnapshotStatus::Running {
      self.started_at = Some(Utc::now());
    }
    if duration_ms.is_some() {
      self.duration_ms = duration_ms;
    }
    self.status = status;
  }
}

/// Snapshot recorded when a run reaches the terminal marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndSnapshot {
  pub id: SnapshotId,
  pub state: Value,
  pub output: Value,
  pub ts: DateTime<Utc>,
}

impl EndSnapshot {
  pub fn new(state: Value, output: Value) -> Self {
    Self {
      id: SnapshotId::generate("end"),
      state,
      output,
      ts: Utc::now(),
    }
  }
}

/// Any persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
  Node(NodeSnapshot),
  End(EndSnapshot),
}

impl Snapshot {
  pub fn id(&self) -> &SnapshotId {
    match self {
      Snapshot::Node(s) => &s.id,
      Snapshot::End(s) => &s.id,
    }
  }

  pub fn as_node(&self) -> Option<&NodeSnapshot> {
    match self {
      Snapshot::Node(s) => Some(s),
      Snapshot::End(_) => None,
    }
  }
}
