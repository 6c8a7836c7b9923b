//! Outcome of one call to [Graph::resume](crate::Graph::resume).

use crate::node::{BoxNode, Node};

/// Outcome of a resume attempt: finished with output, or paused awaiting input.
///
/// The interrupted variant carries the pause node that was about to run; its
/// transition has not executed. Populate its fields and pass it back as
/// `from_node` to continue.
#[derive(Debug)]
pub enum ResumeResult<S, D, O> {
  Finished {
    output: O,
    state: S,
    traceparent: Option<String>,
  },
  Interrupted {
    node: BoxNode<S, D, O>,
    state: S,
    traceparent: Option<String>,
  },
}

impl<S, D, O> ResumeResult<S, D, O> {
  pub fn is_interrupted(&self) -> bool {
    matches!(self, ResumeResult::Interrupted { .. })
  }

  pub fn is_finished(&self) -> bool {
    matches!(self, ResumeResult::Finished { .. })
  }

  /// The pause node awaiting input, if the run was interrupted.
  pub fn interrupt_node(&self) -> Option<&dyn Node<S, D, O>> {
    match self {
      ResumeResult::Interrupted { node, .. } => Some(&**node),
      ResumeResult::Finished { .. } => None,
    }
  }

  /// Run output, if the run finished.
  pub fn output(&self) -> Option<&O> {
    match self {
      ResumeResult::Finished { output, .. } => Some(output),
      ResumeResult::Interrupted { .. } => None,
    }
  }

  /// Run state at the point of return.
  pub fn state(&self) -> &S {
    match self {
      ResumeResult::Finished { state, .. } | ResumeResult::Interrupted { state, .. } => state,
    }
  }

  pub fn traceparent(&self) -> Option<&str> {
    match self {
      ResumeResult::Finished { traceparent, .. } | ResumeResult::Interrupted { traceparent, .. } => {
        traceparent.as_deref()
      }
    }
  }

  pub fn into_state(self) -> S {
    match self {
      ResumeResult::Finished { state, .. } | ResumeResult::Interrupted { state, .. } => state,
    }
  }

  /// Splits an interrupted result into its pause node and state.
  pub fn into_interrupt(self) -> Option<(BoxNode<S, D, O>, S)> {
    match self {
      ResumeResult::Interrupted { node, state, .. } => Some((node, state)),
      ResumeResult::Finished { .. } => None,
    }
  }
}
