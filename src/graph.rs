//! Graph of registered node types.
//!
//! Pipeline: register node types with [GraphBuilder::node] → [GraphBuilder::build]
//! validates edges once → [Graph::initialize] / [Graph::resume] drive runs.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

use crate::error::{GraphError, SetupError};
use crate::graph_run::GraphRun;
use crate::node::{BoxNode, END, Node, NodeKind, NodeType};
use crate::persistence::StatePersistence;
use crate::types::{NodeRecord, NodeSnapshot, SnapshotId};

/// Registration entry of one node type.
pub struct NodeDef<S, D, O> {
  pub name: &'static str,
  pub kind: NodeKind,
  pub successors: &'static [&'static str],
  decode: fn(Value) -> Result<BoxNode<S, D, O>, serde_json::Error>,
}

impl<S, D, O> NodeDef<S, D, O> {
  fn of<T>() -> Self
  where
    T: Node<S, D, O> + NodeType,
  {
    Self {
      name: T::NAME,
      kind: T::KIND,
      successors: T::SUCCESSORS,
      decode: decode_node::<T, S, D, O>,
    }
  }
}

fn decode_node<T, S, D, O>(fields: Value) -> Result<BoxNode<S, D, O>, serde_json::Error>
where
  T: Node<S, D, O> + NodeType,
{
  Ok(Box::new(serde_json::from_value::<T>(fields)?))
}

/// Builder for [Graph].
pub struct GraphBuilder<S, D, O> {
  name: Option<String>,
  defs: Vec<NodeDef<S, D, O>>,
  auto_instrument: bool,
  max_steps: Option<usize>,
}

impl<S, D, O> GraphBuilder<S, D, O> {
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Registers node type `T`.
  pub fn node<T>(mut self) -> Self
  where
    T: Node<S, D, O> + NodeType,
  {
    self.defs.push(NodeDef::of::<T>());
    self
  }

  /// Generate a `traceparent` per run (default true).
  pub fn auto_instrument(mut self, enabled: bool) -> Self {
    self.auto_instrument = enabled;
    self
  }

  /// Fail a run with [GraphError::StepLimitExceeded] after `steps` transitions.
  pub fn max_steps(mut self, steps: usize) -> Self {
    self.max_steps = Some(steps);
    self
  }

  /// Validates the registered node types and builds the graph.
  #[instrument(level = "trace", skip(self), fields(nodes = self.defs.len()))]
  pub fn build(self) -> Result<Graph<S, D, O>, GraphError> {
    validate(&self.defs)?;
    let nodes = self.defs.into_iter().map(|d| (d.name, d)).collect();
    Ok(Graph {
      name: self.name,
      nodes,
      auto_instrument: self.auto_instrument,
      max_steps: self.max_steps,
    })
  }
}

/// Setup checks: unique names, known successors, and pause nodes with at most one
/// successor node besides [END] (and at least one successor overall).
#[instrument(level = "trace", skip(defs))]
pub(crate) fn validate<S, D, O>(defs: &[NodeDef<S, D, O>]) -> Result<(), SetupError> {
  if defs.is_empty() {
    return Err(SetupError::NoNodes);
  }
  let mut names = HashSet::new();
  for def in defs {
    if !names.insert(def.name) {
      return Err(SetupError::DuplicateNode(def.name.to_string()));
    }
  }
  for def in defs {
    let node_successors = def.successors.iter().filter(|s| **s != END).count();
    if def.kind == NodeKind::Pause && (node_successors > 1 || def.successors.is_empty()) {
      return Err(SetupError::PauseSuccessors {
        node: def.name.to_string(),
        successors: def.successors.iter().map(|s| s.to_string()).collect(),
      });
    }
    if let Some(unknown) = def
      .successors
      .iter()
      .find(|s| **s != END && !names.contains(*s))
    {
      return Err(SetupError::UnknownSuccessor {
        node: def.name.to_string(),
        successor: unknown.to_string(),
      });
    }
  }
  Ok(())
}

/// A validated graph of node types over state `S`, dependencies `D` and output `O`.
pub struct Graph<S, D, O> {
  name: Option<String>,
  nodes: HashMap<&'static str, NodeDef<S, D, O>>,
  pub(crate) auto_instrument: bool,
  pub(crate) max_steps: Option<usize>,
}

impl<S, D, O> Graph<S, D, O> {
  pub fn builder() -> GraphBuilder<S, D, O> {
    GraphBuilder {
      name: None,
      defs: Vec::new(),
      auto_instrument: true,
      max_steps: None,
    }
  }

  pub fn name(&self) -> &str {
    self.name.as_deref().unwrap_or("graph")
  }

  pub fn node_def(&self, name: &str) -> Option<&NodeDef<S, D, O>> {
    self.nodes.get(name)
  }

  /// Registered node names, sorted.
  pub fn node_names(&self) -> Vec<&'static str> {
    let mut names: Vec<_> = self.nodes.keys().copied().collect();
    names.sort_unstable();
    names
  }

  /// Serializes a node into its persisted form. The node type must be registered.
  pub fn encode_node(&self, node: &dyn Node<S, D, O>) -> Result<NodeRecord, GraphError> {
    if !self.nodes.contains_key(node.name()) {
      return Err(GraphError::UnknownNode(node.name().to_string()));
    }
    Ok(node.to_record()?)
  }

  /// Rebuilds a node from its persisted form through the registry.
  pub fn decode_node(&self, record: &NodeRecord) -> Result<BoxNode<S, D, O>, GraphError> {
    let def = self
      .nodes
      .get(record.name.as_str())
      .ok_or_else(|| GraphError::UnknownNode(record.name.clone()))?;
    Ok((def.decode)(record.fields.clone())?)
  }
}

impl<S, D, O> Graph<S, D, O>
where
  S: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
  D: Sync + 'static,
  O: Serialize + 'static,
{
  pub(crate) fn encode_state(&self, state: &S) -> Result<Value, GraphError> {
    Ok(serde_json::to_value(state)?)
  }

  pub(crate) fn decode_state(&self, state: &Value) -> Result<S, GraphError> {
    Ok(serde_json::from_value(state.clone())?)
  }

  /// Writes the first snapshot of a run: `start` is the next node to execute.
  #[instrument(level = "debug", skip_all, fields(graph = self.name(), node = start.name()))]
  pub async fn initialize(
    &self,
    start: &dyn Node<S, D, O>,
    persistence: &dyn StatePersistence,
    state: &S,
  ) -> Result<SnapshotId, GraphError> {
    let snapshot = NodeSnapshot::new(self.encode_node(start)?, self.encode_state(state)?);
    let id = snapshot.id.clone();
    persistence.snapshot_node_if_new(snapshot).await?;
    debug!(snapshot_id = %id, "initialized persistence");
    Ok(id)
  }

  /// Starts a run over `state`. Drive it with [GraphRun::next].
  pub fn iter<'a>(
    &'a self,
    state: S,
    deps: Option<&'a D>,
    persistence: Option<&'a dyn StatePersistence>,
  ) -> GraphRun<'a, S, D, O> {
    GraphRun::new(self, state, deps, persistence)
  }
}
