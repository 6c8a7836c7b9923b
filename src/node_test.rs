//! Tests for node metadata and unset-field inspection.

use serde::{Deserialize, Serialize};

use crate::node::{BoxNode, END, Next, NodeKind, NodeMeta, NodeType};
use crate::test_nodes::{Approval, Deps, Goodbye, Greet, State, WaitForName};
use crate::types::{MaybeUnset, UNSET, UNSET_TAG};

type Boxed = BoxNode<State, Deps, String>;

#[test]
fn static_description_is_exposed() {
  let n = WaitForName::default();
  assert_eq!(n.name(), "WaitForName");
  assert_eq!(n.kind(), NodeKind::Pause);
  assert!(n.is_pause());
  assert_eq!(n.successors(), &["Goodbye"]);
  assert!(!Greet.is_pause());
  assert_eq!(Goodbye { name: "x".into() }.successors(), &[END]);
}

#[test]
fn declared_fields_report_unset() {
  let n = WaitForName::default();
  assert_eq!(n.unset_fields(), vec!["user_name".to_string()]);
  assert_eq!(n.unset_fields(), n.unset_fields());
  assert!(WaitForName::with_name("Bobby").unset_fields().is_empty());
}

#[test]
fn serialized_scan_finds_unset_attributes() {
  let mut n = Approval::default();
  assert_eq!(n.unset_fields(), vec!["approver".to_string(), "note".to_string()]);
  n.note = MaybeUnset::Set(None);
  assert_eq!(n.unset_fields(), vec!["approver".to_string()]);
  n.approver = MaybeUnset::Set("ops".to_string());
  assert!(n.unset_fields().is_empty());
}

/// Pause node without declared fields whose plain string may hold any text.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Ask {
  prompt: String,
  answer: MaybeUnset<String>,
}

impl NodeType for Ask {
  const NAME: &'static str = "Ask";
  const KIND: NodeKind = NodeKind::Pause;
  const SUCCESSORS: &'static [&'static str] = &["Goodbye"];
}

#[test]
fn plain_string_equal_to_marker_key_is_not_unset() {
  let mut n = Ask {
    prompt: UNSET_TAG.to_string(),
    answer: MaybeUnset::Set("y".to_string()),
  };
  assert!(n.unset_fields().is_empty());
  n.answer = UNSET.into();
  assert_eq!(n.unset_fields(), vec!["answer".to_string()]);
}

#[test]
fn record_carries_type_tag_and_fields() {
  let record = WaitForName::with_name("Bobby").to_record().unwrap();
  assert_eq!(record.name, "WaitForName");
  assert_eq!(record.fields["user_name"]["$set"], "Bobby");
}

#[test]
fn boxed_node_clones_and_downcasts() {
  let node: Boxed = Box::new(WaitForName::with_name("Bobby"));
  let copy = node.clone();
  let concrete = copy.downcast_ref::<WaitForName>().unwrap();
  assert_eq!(concrete.user_name.get().map(String::as_str), Some("Bobby"));
  assert!(copy.downcast_ref::<Greet>().is_none());
}

#[test]
fn next_target_names_successor() {
  let next: Next<State, Deps, String> = Next::node(Greet);
  assert_eq!(next.target(), "Greet");
  let end: Next<State, Deps, String> = Next::end("done".to_string());
  assert_eq!(end.target(), END);
}
