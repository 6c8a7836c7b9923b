//! Single-step execution of a graph run.
//!
//! [GraphRun::next] runs exactly one node transition and records progress:
//! the node's snapshot goes `Created → Running → Success | Error`, then the
//! successor (or end marker) is snapshotted as the next point to resume from.

use serde::{Serialize, de::DeserializeOwned};
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::node::{BoxNode, GraphRunContext, Next, Node};
use crate::persistence::StatePersistence;
use crate::types::{EndSnapshot, NodeSnapshot, SnapshotId, SnapshotStatus};

/// W3C trace-context header value for a new trace: `00-<trace id>-<span id>-01`.
pub(crate) fn new_traceparent() -> String {
  let trace_id = Uuid::new_v4().simple().to_string();
  let span_id = Uuid::new_v4().simple().to_string();
  format!("00-{}-{}-01", trace_id, &span_id[..16])
}

/// An in-flight run: owns the state between steps.
pub struct GraphRun<'a, S, D, O> {
  graph: &'a Graph<S, D, O>,
  persistence: Option<&'a dyn StatePersistence>,
  deps: Option<&'a D>,
  state: S,
  /// Snapshot of the node the next call to [GraphRun::next] will execute.
  snapshot_id: Option<SnapshotId>,
  /// Set once a pause node passed the unset-field check; consumed by the next step.
  resume_authorized: bool,
  steps: usize,
  traceparent: Option<String>,
}

impl<'a, S, D, O> GraphRun<'a, S, D, O>
where
  S: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
  D: Sync + 'static,
  O: Serialize + 'static,
{
  pub(crate) fn new(
    graph: &'a Graph<S, D, O>,
    state: S,
    deps: Option<&'a D>,
    persistence: Option<&'a dyn StatePersistence>,
  ) -> Self {
    Self {
      graph,
      persistence,
      deps,
      state,
      snapshot_id: None,
      resume_authorized: false,
      steps: 0,
      traceparent: graph.auto_instrument.then(new_traceparent),
    }
  }

  /// Binds the next step to an existing snapshot instead of writing a new one.
  pub(crate) fn with_snapshot_id(mut self, id: Option<SnapshotId>) -> Self {
    self.snapshot_id = id;
    self
  }

  /// Allows the next step to run a pause node whose fields have been checked.
  pub(crate) fn authorize_resumption(&mut self) {
    self.resume_authorized = true;
  }

  pub fn state(&self) -> &S {
    &self.state
  }

  pub fn traceparent(&self) -> Option<&str> {
    self.traceparent.as_deref()
  }

  /// Number of transitions executed so far.
  pub fn steps(&self) -> usize {
    self.steps
  }

  /// Ends the run, returning its state and trace token.
  pub fn into_parts(self) -> (S, Option<String>) {
    (self.state, self.traceparent)
  }

  /// Runs one node transition and records it in persistence.
  ///
  /// A pause node may only be run as the authorized resumption point; anything else
  /// is [GraphError::FatalInternal].
  #[instrument(level = "debug", skip(self, node), fields(node = node.name(), step = self.steps + 1))]
  pub async fn next(&mut self, node: BoxNode<S, D, O>) -> Result<Next<S, D, O>, GraphError> {
    let authorized = std::mem::take(&mut self.resume_authorized);
    if node.is_pause() && !authorized {
      return Err(GraphError::FatalInternal {
        node: node.name().to_string(),
      });
    }
    if let Some(limit) = self.graph.max_steps {
      if self.steps >= limit {
        return Err(GraphError::StepLimitExceeded(limit));
      }
    }
    self.steps += 1;

    let snapshot_id = self.record_start(&*node).await?;
    let started = Instant::now();
    let result = {
      let mut ctx = GraphRunContext {
        state: &mut self.state,
        deps: self.deps,
      };
      node.run(&mut ctx).await
    };
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let next = match result {
      Ok(next) => next,
      Err(source) => {
        self.record_failure(snapshot_id.as_ref(), duration_ms).await;
        return Err(GraphError::Node {
          node: node.name().to_string(),
          source,
        });
      }
    };
    if !node.successors().contains(&next.target()) {
      self.record_failure(snapshot_id.as_ref(), duration_ms).await;
      return Err(GraphError::InvalidTransition {
        node: node.name().to_string(),
        next: next.target().to_string(),
      });
    }

    self.record_status(snapshot_id.as_ref(), SnapshotStatus::Success, duration_ms).await?;
    if let Some(p) = self.persistence {
      match &next {
        Next::Node(n) => {
          let snapshot =
            NodeSnapshot::new(self.graph.encode_node(&**n)?, self.graph.encode_state(&self.state)?);
          self.snapshot_id = Some(snapshot.id.clone());
          p.snapshot_node(snapshot).await?;
        }
        Next::End(output) => {
          let snapshot = EndSnapshot::new(
            self.graph.encode_state(&self.state)?,
            serde_json::to_value(output)?,
          );
          p.snapshot_end(snapshot).await?;
        }
      }
    }
    debug!(snapshot_id = ?snapshot_id, next = next.target(), duration_ms, "step complete");
    Ok(next)
  }

  /// Marks the current node's snapshot running, writing it first if it has none.
  async fn record_start(
    &mut self,
    node: &dyn Node<S, D, O>,
  ) -> Result<Option<SnapshotId>, GraphError> {
    let Some(p) = self.persistence else {
      return Ok(None);
    };
    let id = match self.snapshot_id.take() {
      Some(id) => id,
      None => {
        let snapshot =
          NodeSnapshot::new(self.graph.encode_node(node)?, self.graph.encode_state(&self.state)?);
        let id = snapshot.id.clone();
        p.snapshot_node_if_new(snapshot).await?;
        id
      }
    };
    p.set_status(&id, SnapshotStatus::Running, None).await?;
    Ok(Some(id))
  }

  /// Marks the current snapshot `Error`. A failed write is logged; the caller keeps its own error.
  async fn record_failure(&self, id: Option<&SnapshotId>, duration_ms: u64) {
    if let Err(e) = self.record_status(id, SnapshotStatus::Error, duration_ms).await {
      warn!(snapshot_id = ?id, error = %e, "cannot mark snapshot as failed");
    }
  }

  async fn record_status(
    &self,
    id: Option<&SnapshotId>,
    status: SnapshotStatus,
    duration_ms: u64,
  ) -> Result<(), GraphError> {
    if let (Some(p), Some(id)) = (self.persistence, id) {
      p.set_status(id, status, Some(duration_ms)).await?;
    }
    Ok(())
  }
}
