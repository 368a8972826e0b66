//! Controller-facing types: construction options, events, and callbacks.

use std::sync::Arc;

use crate::remote::RemoteStore;
use crate::types::{TaskId, TaskStatus};

/// Observer notifications emitted by the controller — the engine's
/// equivalent of the toast messages the task page shows. Delivered
/// synchronously; a panicking observer is isolated and cannot break the
/// operation that fired it.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A direct mutation took effect remotely.
    Mutated { id: TaskId },
    /// A status toggle took effect; carries the new status for wording.
    StatusToggled { id: TaskId, status: TaskStatus },
    /// An undo reconciled successfully.
    UndoApplied,
    /// A redo reconciled successfully.
    RedoApplied,
    /// A mutation, undo, or redo failed; `message` is user-presentable.
    OperationFailed { message: String },
}

/// Callback type for controller events.
pub type EventCallback = dyn Fn(&ControllerEvent) + Send + Sync;

/// Configuration for [`Controller`](super::Controller).
pub struct ControllerOptions {
    pub store: Arc<dyn RemoteStore>,
    /// History capacity per direction (`None` = default 100).
    pub capacity: Option<usize>,
    /// Called for each controller event.
    pub on_event: Option<Arc<EventCallback>>,
}

impl ControllerOptions {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            capacity: None,
            on_event: None,
        }
    }
}
