//! In-memory snapshot stores.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::instrument;

use super::{StatePersistence, history};
use crate::error::PersistenceError;
use crate::types::{EndSnapshot, NodeSnapshot, Snapshot, SnapshotId, SnapshotStatus};

/// Keeps only the latest snapshot (overwritten on every step).
#[derive(Debug, Default)]
pub struct SimpleStatePersistence {
  last: Mutex<Option<Snapshot>>,
}

impl SimpleStatePersistence {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl StatePersistence for SimpleStatePersistence {
  #[instrument(level = "trace", skip(self, snapshot), fields(id = %snapshot.id))]
  async fn snapshot_node(&self, snapshot: NodeSnapshot) -> Result<(), PersistenceError> {
    *self.last.lock().await = Some(Snapshot::Node(snapshot));
    Ok(())
  }

  #[instrument(level = "trace", skip(self, snapshot), fields(id = %snapshot.id))]
  async fn snapshot_node_if_new(&self, snapshot: NodeSnapshot) -> Result<(), PersistenceError> {
    let mut last = self.last.lock().await;
    if last.as_ref().map(Snapshot::id) != Some(&snapshot.id) {
      *last = Some(Snapshot::Node(snapshot));
    }
    Ok(())
  }

  #[instrument(level = "trace", skip(self, snapshot), fields(id = %snapshot.id))]
  async fn snapshot_end(&self, snapshot: EndSnapshot) -> Result<(), PersistenceError> {
    *self.last.lock().await = Some(Snapshot::End(snapshot));
    Ok(())
  }

  #[instrument(level = "trace", skip(self))]
  async fn set_status(
    &self,
    id: &SnapshotId,
    status: SnapshotStatus,
    duration_ms: Option<u64>,
  ) -> Result<(), PersistenceError> {
    let mut last = self.last.lock().await;
    match last.as_mut() {
      Some(Snapshot::Node(n)) if &n.id == id => {
        n.transition(status, duration_ms);
        Ok(())
      }
      _ => Err(PersistenceError::SnapshotNotFound(id.clone())),
    }
  }

  async fn load_next(&self) -> Result<Option<NodeSnapshot>, PersistenceError> {
    let last = self.last.lock().await;
    Ok(match last.as_ref() {
      Some(Snapshot::Node(n)) if n.status == SnapshotStatus::Created => Some(n.clone()),
      _ => None,
    })
  }

  async fn load_all(&self) -> Result<Vec<Snapshot>, PersistenceError> {
    Ok(self.last.lock().await.iter().cloned().collect())
  }
}

/// Keeps every snapshot of the run in order.
#[derive(Debug, Default)]
pub struct FullStatePersistence {
  history: Mutex<Vec<Snapshot>>,
}

impl FullStatePersistence {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl StatePersistence for FullStatePersistence {
  #[instrument(level = "trace", skip(self, snapshot), fields(id = %snapshot.id))]
  async fn snapshot_node(&self, snapshot: NodeSnapshot) -> Result<(), PersistenceError> {
    history::upsert_node(&mut *self.history.lock().await, snapshot);
    Ok(())
  }

  #[instrument(level = "trace", skip(self, snapshot), fields(id = %snapshot.id))]
  async fn snapshot_node_if_new(&self, snapshot: NodeSnapshot) -> Result<(), PersistenceError> {
    history::insert_node_if_new(&mut *self.history.lock().await, snapshot);
    Ok(())
  }

  #[instrument(level = "trace", skip(self, snapshot), fields(id = %snapshot.id))]
  async fn snapshot_end(&self, snapshot: EndSnapshot) -> Result<(), PersistenceError> {
    self.history.lock().await.push(Snapshot::End(snapshot));
    Ok(())
  }

  #[instrument(level = "trace", skip(self))]
  async fn set_status(
    &self,
    id: &SnapshotId,
    status: SnapshotStatus,
    duration_ms: Option<u64>,
  ) -> Result<(), PersistenceError> {
    history::set_status(&mut self.history.lock().await, id, status, duration_ms)
  }

  async fn load_next(&self) -> Result<Option<NodeSnapshot>, PersistenceError> {
    Ok(history::next_created(&self.history.lock().await))
  }

  async fn load_all(&self) -> Result<Vec<Snapshot>, PersistenceError> {
    Ok(self.history.lock().await.clone())
  }
}
