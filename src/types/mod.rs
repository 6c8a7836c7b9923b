//! Data types shared by the engine, the resume loop and persistence backends.

mod resume_result;
mod snapshot;
#[cfg(test)]
mod snapshot_test;
pub(crate) mod unset;

pub use resume_result::ResumeResult;
pub use snapshot::{EndSnapshot, NodeRecord, NodeSnapshot, Snapshot, SnapshotId, SnapshotStatus};
pub use unset::{FieldState, MaybeUnset, UNSET, UNSET_TAG, Unset};
