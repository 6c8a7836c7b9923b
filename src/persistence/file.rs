//! Snapshot history save/load to a JSON file.
//!
//! Writes go to a temporary sibling file which is then renamed over the target, so
//! the file on disk is always a complete history.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::instrument;

use super::{StatePersistence, history};
use crate::error::PersistenceError;
use crate::types::{EndSnapshot, NodeSnapshot, Snapshot, SnapshotId, SnapshotStatus};

/// Default filename for the snapshot history under a run directory.
pub const SNAPSHOTS_FILENAME: &str = "snapshots.json";

fn temp_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}

/// Saves `snapshots` to `path` as JSON, replacing the file atomically.
#[instrument(level = "trace", skip(snapshots), fields(count = snapshots.len()))]
pub async fn save_snapshots(path: &Path, snapshots: &[Snapshot]) -> Result<(), PersistenceError> {
  let json = serde_json::to_vec_pretty(snapshots)?;
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent).await?;
  }
  let tmp = temp_path(path);
  tokio::fs::write(&tmp, json).await?;
  tokio::fs::rename(&tmp, path).await?;
  Ok(())
}

/// Loads the snapshot history from `path`. A missing file is an empty history.
#[instrument(level = "trace")]
pub async fn load_snapshots(path: &Path) -> Result<Vec<Snapshot>, PersistenceError> {
  match tokio::fs::read(path).await {
    Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
    Err(e) => Err(e.into()),
  }
}

/// Keeps the full snapshot history in a JSON file. Survives process restarts.
#[derive(Debug)]
pub struct FileStatePersistence {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileStatePersistence {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  /// Persistence at `run_dir/snapshots.json`.
  pub fn in_dir(run_dir: &Path) -> Self {
    Self::new(run_dir.join(SNAPSHOTS_FILENAME))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Loads the history, applies `f`, and writes it back while holding the lock.
  async fn update<F, R>(&self, f: F) -> Result<R, PersistenceError>
  where
    F: FnOnce(&mut Vec<Snapshot>) -> Result<R, PersistenceError>,
  {
    let _guard = self.lock.lock().await;
    let mut snapshots = load_snapshots(&self.path).await?;
    let r = f(&mut snapshots)?;
    save_snapshots(&self.path, &snapshots).await?;
    Ok(r)
  }
}

#[async_trait]
impl StatePersistence for FileStatePersistence {
  async fn snapshot_node(&self, snapshot: NodeSnapshot) -> Result<(), PersistenceError> {
    self
      .update(|h| {
        history::upsert_node(h, snapshot);
        Ok(())
      })
      .await
  }

  async fn snapshot_node_if_new(&self, snapshot: NodeSnapshot) -> Result<(), PersistenceError> {
    self
      .update(|h| {
        history::insert_node_if_new(h, snapshot);
        Ok(())
      })
      .await
  }

  async fn snapshot_end(&self, snapshot: EndSnapshot) -> Result<(), PersistenceError> {
    self
      .update(|h| {
        h.push(Snapshot::End(snapshot));
        Ok(())
      })
      .await
  }

  async fn set_status(
    &self,
    id: &SnapshotId,
    status: SnapshotStatus,
    duration_ms: Option<u64>,
  ) -> Result<(), PersistenceError> {
    self
      .update(|h| history::set_status(h, id, status, duration_ms))
      .await
  }

  async fn load_next(&self) -> Result<Option<NodeSnapshot>, PersistenceError> {
    let _guard = self.lock.lock().await;
    Ok(history::next_created(&load_snapshots(&self.path).await?))
  }

  async fn load_all(&self) -> Result<Vec<Snapshot>, PersistenceError> {
    let _guard = self.lock.lock().await;
    load_snapshots(&self.path).await
  }
}
