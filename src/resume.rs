//! Resume control loop: run a graph until it finishes or reaches a pause node.
//!
//! - [ResumeOptions]: where to start (persistence, explicit node, state overrides).
//! - [Graph::resume]: resolve the start point, check pause-node fields, then step
//!   until `End` or until the next node is a pause node.

use serde::{Serialize, de::DeserializeOwned};
use tracing::{Span, field, info, instrument, warn};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::node::{BoxNode, Next, Node};
use crate::persistence::StatePersistence;
use crate::types::{NodeSnapshot, ResumeResult, SnapshotId};

/// Options for [Graph::resume]. At least one of `persistence` and `from_node` is required.
pub struct ResumeOptions<'a, S, D, O> {
  /// Snapshot store to load the next node and state from, and to record progress in.
  pub persistence: Option<&'a dyn StatePersistence>,
  /// Node to resume from. Overrides the node from the persisted snapshot.
  pub from_node: Option<BoxNode<S, D, O>>,
  /// State to resume with. Overrides the state from the persisted snapshot.
  pub state: Option<S>,
  pub deps: Option<&'a D>,
}

impl<S, D, O> Default for ResumeOptions<'_, S, D, O> {
  fn default() -> Self {
    Self {
      persistence: None,
      from_node: None,
      state: None,
      deps: None,
    }
  }
}

impl<'a, S, D, O> ResumeOptions<'a, S, D, O> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn persistence(mut self, persistence: &'a dyn StatePersistence) -> Self {
    self.persistence = Some(persistence);
    self
  }

  pub fn from_node(mut self, node: impl Node<S, D, O>) -> Self {
    self.from_node = Some(Box::new(node));
    self
  }

  /// Like [ResumeOptions::from_node] for a node already boxed, e.g. one taken from a [ResumeResult].
  pub fn from_boxed(mut self, node: BoxNode<S, D, O>) -> Self {
    self.from_node = Some(node);
    self
  }

  pub fn state(mut self, state: S) -> Self {
    self.state = Some(state);
    self
  }

  pub fn deps(mut self, deps: &'a D) -> Self {
    self.deps = Some(deps);
    self
  }
}

/// Resolved starting point of a resume call.
struct StartPoint<S, D, O> {
  node: BoxNode<S, D, O>,
  state: S,
  /// Loaded snapshot, and whether the caller overrode its node or state.
  snapshot: Option<(NodeSnapshot, bool)>,
}

impl<S, D, O> Graph<S, D, O>
where
  S: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
  D: Sync + 'static,
  O: Serialize + 'static,
{
  /// Runs the graph from the persisted next node, or from `from_node`, until it
  /// ends or the next node to run is a pause node.
  ///
  /// Starts and continues a run alike. A pause node given as the start point must
  /// have every field set; its transition then runs as the first step.
  #[instrument(
    level = "info",
    skip_all,
    fields(graph = self.name(), start = field::Empty, traceparent = field::Empty)
  )]
  pub async fn resume(
    &self,
    options: ResumeOptions<'_, S, D, O>,
  ) -> Result<ResumeResult<S, D, O>, GraphError> {
    let ResumeOptions {
      persistence,
      from_node,
      state,
      deps,
    } = options;
    let start = self.resolve_start(persistence, from_node, state).await?;
    Span::current().record("start", start.node.name());

    if start.node.is_pause() {
      let fields = start.node.unset_fields();
      if !fields.is_empty() {
        warn!(node = start.node.name(), ?fields, "refusing to resume from partially populated pause node");
        return Err(GraphError::Resumption {
          node: start.node.name().to_string(),
          fields,
        });
      }
    }

    let snapshot_id = match (persistence, start.snapshot) {
      (Some(p), Some((snapshot, overridden))) => Some(self.persist_override(p, snapshot, overridden, &*start.node, &start.state).await?),
      _ => None,
    };

    let mut run = self
      .iter(start.state, deps, persistence)
      .with_snapshot_id(snapshot_id);
    if let Some(tp) = run.traceparent() {
      Span::current().record("traceparent", tp);
    }
    if start.node.is_pause() {
      run.authorize_resumption();
    }
    info!("run resumed");

    let mut node = start.node;
    loop {
      match run.next(node).await? {
        Next::Node(next) if next.is_pause() => {
          info!(node = next.name(), steps = run.steps(), "run interrupted");
          let (state, traceparent) = run.into_parts();
          return Ok(ResumeResult::Interrupted {
            node: next,
            state,
            traceparent,
          });
        }
        Next::Node(next) => node = next,
        Next::End(output) => {
          info!(steps = run.steps(), "run finished");
          let (state, traceparent) = run.into_parts();
          return Ok(ResumeResult::Finished {
            output,
            state,
            traceparent,
          });
        }
      }
    }
  }

  /// Start node and state: explicit arguments win over the persisted snapshot.
  async fn resolve_start(
    &self,
    persistence: Option<&dyn StatePersistence>,
    from_node: Option<BoxNode<S, D, O>>,
    state: Option<S>,
  ) -> Result<StartPoint<S, D, O>, GraphError> {
    match (persistence, from_node) {
      (None, None) => Err(GraphError::Configuration),
      (None, Some(node)) => {
        if self.node_def(node.name()).is_none() {
          return Err(GraphError::UnknownNode(node.name().to_string()));
        }
        Ok(StartPoint {
          node,
          state: state.unwrap_or_default(),
          snapshot: None,
        })
      }
      (Some(p), from_node) => {
        let snapshot = p.load_next().await?.ok_or(GraphError::Recovery)?;
        let overridden = from_node.is_some() || state.is_some();
        let node = match from_node {
          Some(node) => node,
          None => self.decode_node(&snapshot.node)?,
        };
        let state = match state {
          Some(state) => state,
          None => self.decode_state(&snapshot.state)?,
        };
        Ok(StartPoint {
          node,
          state,
          snapshot: Some((snapshot, overridden)),
        })
      }
    }
  }

  /// Rewrites the loaded snapshot with caller overrides before the first step.
  ///
  /// The snapshot keeps its id, even when the override is a different node type.
  async fn persist_override(
    &self,
    persistence: &dyn StatePersistence,
    snapshot: NodeSnapshot,
    overridden: bool,
    node: &dyn Node<S, D, O>,
    state: &S,
  ) -> Result<SnapshotId, GraphError> {
    if overridden {
      let updated = NodeSnapshot {
        node: self.encode_node(node)?,
        state: self.encode_state(state)?,
        ..snapshot
      };
      let id = updated.id.clone();
      persistence.snapshot_node(updated).await?;
      info!(snapshot_id = %id, "persisted start point override");
      return Ok(id);
    }
    Ok(snapshot.id)
  }
}
