//! Node fixtures shared by unit tests.
//!
//! Greet → WaitForName (pause) → Goodbye → End, plus nodes that misbehave.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::graph::{Graph, GraphBuilder};
use crate::node::{END, GraphRunContext, Next, Node, NodeError, NodeKind, NodeType};
use crate::types::{FieldState, MaybeUnset, UNSET};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
  pub visited: Vec<String>,
  pub user_name: Option<String>,
}

#[derive(Debug)]
pub struct Deps {
  pub salutation: &'static str,
}

pub type Ctx<'a> = GraphRunContext<'a, State, Deps>;
pub type Outcome = Result<Next<State, Deps, String>, NodeError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Greet;

impl NodeType for Greet {
  const NAME: &'static str = "Greet";
  const SUCCESSORS: &'static [&'static str] = &["WaitForName"];
}

#[async_trait]
impl Node<State, Deps, String> for Greet {
  async fn run(&self, ctx: &mut Ctx<'_>) -> Outcome {
    ctx.state.visited.push(Self::NAME.to_string());
    Ok(Next::node(WaitForName::default()))
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitForName {
  pub user_name: MaybeUnset<String>,
}

impl WaitForName {
  pub fn with_name(name: &str) -> Self {
    Self {
      user_name: MaybeUnset::Set(name.to_string()),
    }
  }
}

impl NodeType for WaitForName {
  const NAME: &'static str = "WaitForName";
  const KIND: NodeKind = NodeKind::Pause;
  const SUCCESSORS: &'static [&'static str] = &["Goodbye"];

  fn declared_fields(&self) -> Option<Vec<FieldState>> {
    Some(vec![FieldState::of("user_name", &self.user_name)])
  }
}

#[async_trait]
impl Node<State, Deps, String> for WaitForName {
  async fn run(&self, ctx: &mut Ctx<'_>) -> Outcome {
    let name = self.user_name.require("user_name")?.clone();
    ctx.state.visited.push(Self::NAME.to_string());
    ctx.state.user_name = Some(name.clone());
    Ok(Next::node(Goodbye { name }))
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goodbye {
  pub name: String,
}

impl NodeType for Goodbye {
  const NAME: &'static str = "Goodbye";
  const SUCCESSORS: &'static [&'static str] = &[END];
}

#[async_trait]
impl Node<State, Deps, String> for Goodbye {
  async fn run(&self, ctx: &mut Ctx<'_>) -> Outcome {
    ctx.state.visited.push(Self::NAME.to_string());
    let salutation = ctx.deps.map_or("Goodbye", |d| d.salutation);
    Ok(Next::end(format!("{}, {}!", salutation, self.name)))
  }
}

/// Pause node without declared fields: inspected through its serialized attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
  pub approver: MaybeUnset<String>,
  pub note: MaybeUnset<Option<String>>,
  pub attempts: u32,
}

impl Default for Approval {
  fn default() -> Self {
    Self {
      approver: UNSET.into(),
      note: UNSET.into(),
      attempts: 0,
    }
  }
}

impl NodeType for Approval {
  const NAME: &'static str = "Approval";
  const KIND: NodeKind = NodeKind::Pause;
  const SUCCESSORS: &'static [&'static str] = &["Goodbye"];
}

#[async_trait]
impl Node<State, Deps, String> for Approval {
  async fn run(&self, _ctx: &mut Ctx<'_>) -> Outcome {
    let name = self.approver.require("approver")?.clone();
    Ok(Next::node(Goodbye { name }))
  }
}

/// Pause node declaring two successors; rejected at build time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ambiguous;

impl NodeType for Ambiguous {
  const NAME: &'static str = "Ambiguous";
  const KIND: NodeKind = NodeKind::Pause;
  const SUCCESSORS: &'static [&'static str] = &["Greet", "Goodbye"];
}

#[async_trait]
impl Node<State, Deps, String> for Ambiguous {
  async fn run(&self, _ctx: &mut Ctx<'_>) -> Outcome {
    Ok(Next::node(Greet))
  }
}

/// Transition that always fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explode;

impl NodeType for Explode {
  const NAME: &'static str = "Explode";
  const SUCCESSORS: &'static [&'static str] = &[END];
}

#[async_trait]
impl Node<State, Deps, String> for Explode {
  async fn run(&self, _ctx: &mut Ctx<'_>) -> Outcome {
    Err("boom".into())
  }
}

/// Yields a successor it does not declare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stray;

impl NodeType for Stray {
  const NAME: &'static str = "Stray";
  const SUCCESSORS: &'static [&'static str] = &[END];
}

#[async_trait]
impl Node<State, Deps, String> for Stray {
  async fn run(&self, _ctx: &mut Ctx<'_>) -> Outcome {
    Ok(Next::node(Greet))
  }
}

/// Loops on itself forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spin {
  pub turns: u32,
}

impl NodeType for Spin {
  const NAME: &'static str = "Spin";
  const SUCCESSORS: &'static [&'static str] = &["Spin", END];
}

#[async_trait]
impl Node<State, Deps, String> for Spin {
  async fn run(&self, _ctx: &mut Ctx<'_>) -> Outcome {
    Ok(Next::node(Spin {
      turns: self.turns + 1,
    }))
  }
}

pub type TestGraph = Graph<State, Deps, String>;

/// Builder with every well-formed fixture registered.
pub fn fixture_builder() -> GraphBuilder<State, Deps, String> {
  Graph::builder()
    .name("greeting")
    .node::<Greet>()
    .node::<WaitForName>()
    .node::<Goodbye>()
    .node::<Approval>()
    .node::<Explode>()
    .node::<Stray>()
    .node::<Spin>()
}

pub fn greeting_graph() -> TestGraph {
  fixture_builder().build().unwrap()
}
