//! # resumable-graph
//!
//! Pause/resume control loop for graphs of typed nodes.
//!
//! ## Architecture
//!
//! A [Graph] registers node types (see [NodeType]) and runs them one transition at a
//! time ([GraphRun::next]), recording a snapshot of "next node + state" in a
//! [StatePersistence] backend after each step.
//!
//! [Graph::resume] continues a run from persistence or from a caller-supplied node and
//! stops at the first pause node ([NodeKind::Pause]), returning
//! [ResumeResult::Interrupted]. The caller populates the pause node's
//! [MaybeUnset] fields and resumes again; a pause node with fields still [UNSET] is
//! refused with [GraphError::Resumption].

pub mod error;
pub mod graph;
pub mod graph_run;
pub mod node;
#[cfg(test)]
mod node_test;
pub mod persistence;
pub mod resume;
#[cfg(test)]
pub(crate) mod test_nodes;
pub mod types;

pub use error::{GraphError, PersistenceError, SetupError, UnsetFieldError};
pub use graph::{Graph, GraphBuilder, NodeDef};
pub use graph_run::GraphRun;
pub use node::{BoxNode, END, GraphRunContext, Next, Node, NodeError, NodeKind, NodeMeta, NodeType};
pub use persistence::{
  FileStatePersistence, FullStatePersistence, SNAPSHOTS_FILENAME, SimpleStatePersistence,
  StatePersistence,
};
pub use resume::ResumeOptions;
pub use types::{
  EndSnapshot, FieldState, MaybeUnset, NodeRecord, NodeSnapshot, ResumeResult, Snapshot,
  SnapshotId, SnapshotStatus, UNSET, UNSET_TAG, Unset,
};
