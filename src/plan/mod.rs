//! Reconciliation planning: the plan type and the snapshot differ.

mod diff;

pub use diff::diff;

use crate::types::{TaskId, TaskRecord};

/// The three disjoint operation sets derived from comparing two snapshots.
///
/// `to_create` holds records present only in the target (their stored ids
/// are stale — the remote store mints new identities on create),
/// `to_delete` holds ids present only in the current snapshot, and
/// `to_update` holds the target version of records present in both but
/// differing in any field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationPlan {
    pub to_create: Vec<TaskRecord>,
    pub to_update: Vec<TaskRecord>,
    pub to_delete: Vec<TaskId>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of remote operations the plan will issue.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}

/// A single operation from a plan, kept whole so a failed batch can name
/// exactly what did not take effect (and rebuild a retry plan from it).
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedOp {
    Create(TaskRecord),
    Update(TaskRecord),
    Delete(TaskId),
}

impl PlannedOp {
    /// Short human-readable form for failure reports.
    pub fn describe(&self) -> String {
        match self {
            PlannedOp::Create(record) => format!("create \"{}\"", record.fields.title),
            PlannedOp::Update(record) => format!("update {}", record.id),
            PlannedOp::Delete(id) => format!("delete {id}"),
        }
    }
}
