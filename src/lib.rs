//! task-rewind — client-side undo/redo for a remotely-persisted task
//! collection.
//!
//! The remote store has no versioning and no concept of undo, so the engine
//! keeps bounded history stacks of collection snapshots, diffs two
//! snapshots into a create/update/delete plan, and applies the plan against
//! a [`remote::RemoteStore`] adapter while the UI keeps showing the local
//! view.

pub mod error;
pub mod history;
pub mod plan;
pub mod query;
pub mod reconcile;
pub mod remote;
pub mod types;

pub use error::{
    AdapterError, AdapterErrorKind, FailedOperation, HistoryError, ReconciliationFailure, Result,
    RewindError,
};
pub use history::BoundedStack;
pub use plan::{diff, PlannedOp, ReconciliationPlan};
pub use reconcile::{apply, Controller, ControllerEvent, ControllerOptions};
pub use remote::RemoteStore;
pub use types::{Priority, Snapshot, TaskFields, TaskId, TaskRecord, TaskStatus};
