//! Unset sentinel for pause-node fields that the caller must supply before resuming.
//!
//! A field declared as [MaybeUnset<T>] is either `Set(T)` or `Unset`. `Unset` is
//! distinct from every value of `T`, including `None`, `false` and empty collections.
//!
//! Serialized forms: `{"$set": v}` and `{"$unset": true}`. No plain string or number
//! encodes as the unset marker, so the marker can be found in a serialized node.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UnsetFieldError;

/// Key of the serialized [MaybeUnset::Unset] marker object.
pub const UNSET_TAG: &str = "$unset";

/// Key of the serialized [MaybeUnset::Set] wrapper object.
const SET_TAG: &str = "$set";

/// Marker type of the unset sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Unset;

/// The process-wide unset sentinel. Use `UNSET.into()` as a pause-node field default.
pub const UNSET: Unset = Unset;

/// A field value that may still hold the unset sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MaybeUnset<T> {
  Set(T),
  Unset,
}

impl<T: Serialize> Serialize for MaybeUnset<T> {
  fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
    match self {
      MaybeUnset::Set(v) => serializer.serialize_newtype_variant("MaybeUnset", 0, SET_TAG, v),
      MaybeUnset::Unset => serializer.serialize_newtype_variant("MaybeUnset", 1, UNSET_TAG, &true),
    }
  }
}

/// Wire form of [MaybeUnset].
#[derive(Deserialize)]
enum Repr<T> {
  #[serde(rename = "$set")]
  Set(T),
  #[serde(rename = "$unset")]
  Unset(bool),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for MaybeUnset<T> {
  fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
    match Repr::<T>::deserialize(deserializer)? {
      Repr::Set(v) => Ok(MaybeUnset::Set(v)),
      Repr::Unset(true) => Ok(MaybeUnset::Unset),
      Repr::Unset(false) => Err(de::Error::invalid_value(
        de::Unexpected::Bool(false),
        &"`true` as the unset marker",
      )),
    }
  }
}

impl<T> MaybeUnset<T> {
  pub fn is_set(&self) -> bool {
    matches!(self, MaybeUnset::Set(_))
  }

  pub fn is_unset(&self) -> bool {
    matches!(self, MaybeUnset::Unset)
  }

  pub fn get(&self) -> Option<&T> {
    match self {
      MaybeUnset::Set(v) => Some(v),
      MaybeUnset::Unset => None,
    }
  }

  pub fn into_option(self) -> Option<T> {
    match self {
      MaybeUnset::Set(v) => Some(v),
      MaybeUnset::Unset => None,
    }
  }

  /// Returns the value, or an error naming `field` if it is unset.
  pub fn require(&self, field: &'static str) -> Result<&T, UnsetFieldError> {
    self.get().ok_or(UnsetFieldError(field))
  }
}

impl<T> Default for MaybeUnset<T> {
  fn default() -> Self {
    MaybeUnset::Unset
  }
}

impl<T> From<Unset> for MaybeUnset<T> {
  fn from(_: Unset) -> Self {
    MaybeUnset::Unset
  }
}

impl<T> PartialEq<Unset> for MaybeUnset<T> {
  fn eq(&self, _: &Unset) -> bool {
    self.is_unset()
  }
}

/// One declared field of a node and whether it currently holds the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldState {
  pub name: &'static str,
  pub unset: bool,
}

impl FieldState {
  pub fn of<T>(name: &'static str, value: &MaybeUnset<T>) -> Self {
    Self {
      name,
      unset: value.is_unset(),
    }
  }

  /// A declared field whose type cannot hold the sentinel.
  pub fn always_set(name: &'static str) -> Self {
    Self { name, unset: false }
  }
}

/// True for exactly the serialized [MaybeUnset::Unset] marker, `{"$unset": true}`.
pub(crate) fn is_unset_marker(value: &Value) -> bool {
  match value {
    Value::Object(map) => map.len() == 1 && map.get(UNSET_TAG) == Some(&Value::Bool(true)),
    _ => false,
  }
}

/// Names of top-level attributes in a serialized node that hold the sentinel.
/// Order follows the serialized map (alphabetical for `serde_json` objects).
pub(crate) fn unset_attributes(fields: &Value) -> Vec<String> {
  match fields {
    Value::Object(map) => map
      .iter()
      .filter(|(_, v)| is_unset_marker(v))
      .map(|(k, _)| k.clone())
      .collect(),
    _ => Vec::new(),
  }
}
