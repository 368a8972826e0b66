use std::fmt;

use thiserror::Error;

use crate::plan::{PlannedOp, ReconciliationPlan};
use crate::types::TaskId;

// ---------------------------------------------------------------------------
// HistoryError
// ---------------------------------------------------------------------------

/// Invariant violations in the bounded history stacks.
///
/// These indicate caller-logic bugs (capacity sized below the session's
/// mutation count, or pop/peek without an emptiness check) and must never be
/// presented as remote failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("Stack overflow: history capacity of {capacity} exceeded")]
    Overflow { capacity: usize },

    #[error("Stack underflow: pop or peek on an empty history stack")]
    Underflow,
}

// ---------------------------------------------------------------------------
// AdapterError
// ---------------------------------------------------------------------------

/// Classification of a remote store failure.
///
/// The core treats every kind uniformly as "this operation did not take
/// effect" and never retries automatically; the kind exists so the UI layer
/// can word its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterErrorKind {
    /// Transport-level failure (timeout, connection refused, etc.).
    Network,
    /// The store rejected the payload.
    Validation,
    /// The targeted record does not exist remotely.
    NotFound,
    /// The session is not allowed to perform the operation.
    Unauthorized,
}

/// A single remote operation failure, as reported by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: AdapterErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn with_kind(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AdapterError {}

// ---------------------------------------------------------------------------
// ReconciliationFailure
// ---------------------------------------------------------------------------

/// A planned operation that did not take effect, with the adapter's reason.
#[derive(Debug, Clone)]
pub struct FailedOperation {
    pub op: PlannedOp,
    pub error: AdapterError,
}

/// One or more failures from a reconciliation batch.
///
/// Operations that succeeded in the same batch are NOT compensated or rolled
/// back; the authoritative store and the local view may diverge after a
/// failed undo/redo. Callers that want to converge should resubmit
/// [`ReconciliationFailure::retry_plan`], which contains only the failed
/// subset.
#[derive(Debug, Clone)]
pub struct ReconciliationFailure {
    pub failed: Vec<FailedOperation>,
    /// Total operations dispatched in the batch, including the ones that
    /// succeeded.
    pub attempted: usize,
}

impl ReconciliationFailure {
    /// Rebuild a plan containing only the operations that failed, so a retry
    /// resubmits exactly those and nothing that already took effect.
    pub fn retry_plan(&self) -> ReconciliationPlan {
        let mut plan = ReconciliationPlan::default();
        for failure in &self.failed {
            match &failure.op {
                PlannedOp::Create(record) => plan.to_create.push(record.clone()),
                PlannedOp::Update(record) => plan.to_update.push(record.clone()),
                PlannedOp::Delete(id) => plan.to_delete.push(id.clone()),
            }
        }
        plan
    }
}

impl fmt::Display for ReconciliationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reconciliation failed: {} of {} operations did not take effect",
            self.failed.len(),
            self.attempted
        )?;
        for failure in &self.failed {
            write!(f, "\n  - {}: {}", failure.op.describe(), failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ReconciliationFailure {}

// ---------------------------------------------------------------------------
// RewindError — top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RewindError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationFailure),

    /// An undo or redo is already in flight for this controller.
    #[error("Operation in progress: undo/redo rejected while another is running")]
    Busy,

    /// A direct mutation targeted an id absent from the current snapshot.
    #[error("Unknown task: no record with id \"{0}\" in the current snapshot")]
    UnknownTask(TaskId),
}

/// Convenience alias — the default error type is `RewindError`.
pub type Result<T, E = RewindError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
