//! Error taxonomy for graph setup, resumption and persistence.

use thiserror::Error;

use crate::node::NodeError;
use crate::types::SnapshotId;

/// Failure raised by a [StatePersistence](crate::persistence::StatePersistence) backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
  #[error("snapshot io failed: {0}")]
  Io(#[from] std::io::Error),
  #[error("snapshot encoding failed: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("snapshot `{0}` not found")]
  SnapshotNotFound(SnapshotId),
}

/// Graph construction failures. Detected once by [GraphBuilder::build](crate::GraphBuilder::build).
#[derive(Debug, Error)]
pub enum SetupError {
  #[error("graph has no nodes")]
  NoNodes,
  #[error("node `{0}` is registered more than once")]
  DuplicateNode(String),
  #[error(
    "pause node `{node}` must declare a single successor node, optionally with `End`, found: [{}]",
    successors.join(", ")
  )]
  PauseSuccessors {
    node: String,
    successors: Vec<String>,
  },
  #[error("node `{node}` declares successor `{successor}`, which is not registered in the graph")]
  UnknownSuccessor { node: String, successor: String },
}

/// Errors surfaced by [Graph](crate::Graph) operations.
#[derive(Debug, Error)]
pub enum GraphError {
  /// Neither a persistence backend nor an explicit start node was supplied.
  #[error("either `persistence` or `from_node` must be provided")]
  Configuration,
  /// Persistence was consulted but holds no snapshot to resume from.
  #[error("unable to restore snapshot from state persistence")]
  Recovery,
  /// The resolved start node is a pause node with fields still unset.
  #[error(
    "cannot resume graph from pause node `{node}` because of unset fields: {}",
    fields.join(", ")
  )]
  Resumption { node: String, fields: Vec<String> },
  #[error(transparent)]
  Setup(#[from] SetupError),
  /// A pause node's transition was invoked outside of resumption. Never recovered from.
  #[error("fatal: transition of pause node `{node}` invoked outside of resumption")]
  FatalInternal { node: String },
  #[error("node `{0}` is not registered in this graph")]
  UnknownNode(String),
  #[error("node `{node}` transitioned to `{next}`, which it does not declare as a successor")]
  InvalidTransition { node: String, next: String },
  #[error("step limit of {0} exceeded")]
  StepLimitExceeded(usize),
  #[error("node `{node}` failed: {source}")]
  Node {
    node: String,
    #[source]
    source: NodeError,
  },
  #[error(transparent)]
  Persistence(#[from] PersistenceError),
  #[error("state encoding failed: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl GraphError {
  /// True for [GraphError::FatalInternal], which indicates a broken engine invariant.
  pub fn is_fatal(&self) -> bool {
    matches!(self, GraphError::FatalInternal { .. })
  }

  /// Field names carried by a [GraphError::Resumption] error.
  pub fn unset_fields(&self) -> Option<&[String]> {
    match self {
      GraphError::Resumption { fields, .. } => Some(fields),
      _ => None,
    }
  }
}

/// Returned by [MaybeUnset::require](crate::MaybeUnset::require) for a field still holding the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{0}` is unset")]
pub struct UnsetFieldError(pub &'static str);
