//! Node model: ordinary step nodes and pause nodes.
//!
//! Every node struct implements two traits:
//!
//! - [NodeType]: static description (type tag, kind, declared successors).
//! - [Node]: the async transition producing the next node or the terminal marker.
//!
//! [NodeMeta] is the object-safe view of [NodeType], implemented for every node type,
//! so the engine can inspect a `Box<dyn Node>` without knowing its concrete type.
//!
//! A pause node (`KIND = NodeKind::Pause`) halts the control loop when it is the next
//! node to run. Its transition only executes as the resumption handoff, once every
//! field has been populated by the caller.

use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::{Serialize, de::DeserializeOwned};
use std::any::Any;
use std::fmt;
use tracing::warn;

use crate::types::{FieldState, NodeRecord};
use crate::types::unset::unset_attributes;

/// Successor name standing for the terminal marker.
pub const END: &str = "End";

/// Error type returned by node transitions.
pub type NodeError = Box<dyn std::error::Error + Send + Sync>;

/// A type-erased node.
pub type BoxNode<S, D, O> = Box<dyn Node<S, D, O>>;

/// Capability of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
  /// Ordinary node: may declare several successors.
  Step,
  /// Pause node: halts the run, declares a single successor node (plus optionally [END]).
  Pause,
}

/// Static description of a node type.
pub trait NodeType: Serialize + DeserializeOwned + fmt::Debug + Clone + Send + Sync + 'static {
  /// Type tag recorded in snapshots. Unique within a graph.
  const NAME: &'static str;
  const KIND: NodeKind = NodeKind::Step;
  /// Names of node types the transition may yield; [END] for the terminal marker.
  const SUCCESSORS: &'static [&'static str];

  /// Declared fields with their unset status.
  ///
  /// Types returning `None` are inspected through their serialized attributes instead.
  fn declared_fields(&self) -> Option<Vec<FieldState>> {
    None
  }
}

/// Object-safe view of a node's static description and field values.
pub trait NodeMeta: fmt::Debug + Send + Sync {
  fn name(&self) -> &'static str;
  fn kind(&self) -> NodeKind;
  fn successors(&self) -> &'static [&'static str];
  /// Serializes the node into its persisted form.
  fn to_record(&self) -> Result<NodeRecord, serde_json::Error>;
  /// Names of fields currently holding the unset sentinel. Repeatable; never mutates.
  fn unset_fields(&self) -> Vec<String>;
  fn as_any(&self) -> &dyn Any;

  fn is_pause(&self) -> bool {
    self.kind() == NodeKind::Pause
  }
}

impl<T: NodeType> NodeMeta for T {
  fn name(&self) -> &'static str {
    T::NAME
  }

  fn kind(&self) -> NodeKind {
    T::KIND
  }

  fn successors(&self) -> &'static [&'static str] {
    T::SUCCESSORS
  }

  fn to_record(&self) -> Result<NodeRecord, serde_json::Error> {
    Ok(NodeRecord {
      name: T::NAME.to_string(),
      fields: serde_json::to_value(self)?,
    })
  }

  fn unset_fields(&self) -> Vec<String> {
    if let Some(fields) = self.declared_fields() {
      return fields
        .into_iter()
        .filter(|f| f.unset)
        .map(|f| f.name.to_string())
        .collect();
    }
    match serde_json::to_value(self) {
      Ok(fields) => unset_attributes(&fields),
      Err(e) => {
        warn!(node = T::NAME, error = %e, "cannot serialize node to inspect unset fields");
        Vec::new()
      }
    }
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Context handed to a node transition.
pub struct GraphRunContext<'a, S, D> {
  /// Run state, exclusively borrowed for the duration of the transition.
  pub state: &'a mut S,
  pub deps: Option<&'a D>,
}

/// Result of a node transition.
#[derive(Debug)]
pub enum Next<S, D, O> {
  Node(BoxNode<S, D, O>),
  /// Terminal marker carrying the run output.
  End(O),
}

impl<S, D, O> Next<S, D, O> {
  pub fn node(node: impl Node<S, D, O>) -> Self {
    Next::Node(Box::new(node))
  }

  pub fn end(output: O) -> Self {
    Next::End(output)
  }

  /// Name of the successor this transition yields ([END] for the terminal marker).
  pub fn target(&self) -> &'static str {
    match self {
      Next::Node(n) => n.name(),
      Next::End(_) => END,
    }
  }
}

/// A graph node: state `S`, dependencies `D`, run output `O`.
#[async_trait]
pub trait Node<S, D, O>: NodeMeta + DynClone + 'static {
  async fn run(&self, ctx: &mut GraphRunContext<'_, S, D>) -> Result<Next<S, D, O>, NodeError>;
}

dyn_clone::clone_trait_object!(<S, D, O> Node<S, D, O>);

impl<S: 'static, D: 'static, O: 'static> dyn Node<S, D, O> {
  /// Downcasts to a concrete node type.
  pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
    self.as_any().downcast_ref::<T>()
  }
}
