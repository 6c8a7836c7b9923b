//! Snapshot store contract consumed by the engine and the resume loop.
//!
//! Backends hold serialized [Snapshot]s. Every write replaces a whole record, so a
//! reader never observes a half-updated snapshot.

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::types::{EndSnapshot, NodeSnapshot, Snapshot, SnapshotId, SnapshotStatus};

mod file;
mod in_memory;

pub use file::{FileStatePersistence, SNAPSHOTS_FILENAME, load_snapshots, save_snapshots};
pub use in_memory::{FullStatePersistence, SimpleStatePersistence};

/// Durable record of "next node + state + identity" for one run.
#[async_trait]
pub trait StatePersistence: Send + Sync {
  /// Writes a node snapshot, replacing any snapshot with the same id.
  async fn snapshot_node(&self, snapshot: NodeSnapshot) -> Result<(), PersistenceError>;

  /// Writes a node snapshot unless one with the same id already exists.
  async fn snapshot_node_if_new(&self, snapshot: NodeSnapshot) -> Result<(), PersistenceError>;

  async fn snapshot_end(&self, snapshot: EndSnapshot) -> Result<(), PersistenceError>;

  /// Moves the node snapshot `id` to `status`.
  async fn set_status(
    &self,
    id: &SnapshotId,
    status: SnapshotStatus,
    duration_ms: Option<u64>,
  ) -> Result<(), PersistenceError>;

  /// Returns the next node snapshot to execute (status `Created`) without modifying it.
  async fn load_next(&self) -> Result<Option<NodeSnapshot>, PersistenceError>;

  /// Every snapshot the backend retains, oldest first.
  async fn load_all(&self) -> Result<Vec<Snapshot>, PersistenceError>;
}

/// Operations on an ordered snapshot history, shared by history-keeping backends.
pub(crate) mod history {
  use super::{NodeSnapshot, PersistenceError, Snapshot, SnapshotId, SnapshotStatus};

  pub(crate) fn upsert_node(history: &mut Vec<Snapshot>, snapshot: NodeSnapshot) {
    match history.iter_mut().find(|s| s.id() == &snapshot.id) {
      Some(slot) => *slot = Snapshot::Node(snapshot),
      None => history.push(Snapshot::Node(snapshot)),
    }
  }

  /// Returns true if the snapshot was inserted.
  pub(crate) fn insert_node_if_new(history: &mut Vec<Snapshot>, snapshot: NodeSnapshot) -> bool {
    if history.iter().any(|s| s.id() == &snapshot.id) {
      return false;
    }
    history.push(Snapshot::Node(snapshot));
    true
  }

  pub(crate) fn set_status(
    history: &mut [Snapshot],
    id: &SnapshotId,
    status: SnapshotStatus,
    duration_ms: Option<u64>,
  ) -> Result<(), PersistenceError> {
    let node = history
      .iter_mut()
      .find_map(|s| match s {
        Snapshot::Node(n) if &n.id == id => Some(n),
        _ => None,
      })
      .ok_or_else(|| PersistenceError::SnapshotNotFound(id.clone()))?;
    node.transition(status, duration_ms);
    Ok(())
  }

  pub(crate) fn next_created(history: &[Snapshot]) -> Option<NodeSnapshot> {
    history.iter().find_map(|s| match s {
      Snapshot::Node(n) if n.status == SnapshotStatus::Created => Some(n.clone()),
      _ => None,
    })
  }
}
