use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable record identity, minted by the remote store on creation.
/// Never assigned locally.
pub type TaskId = String;

/// An immutable ordered copy of the full task collection at one moment.
/// Captured by cloning; a stored snapshot is never edited in place.
pub type Snapshot = Vec<TaskRecord>;

// ============================================================================
// Priority
// ============================================================================

/// Task priority. The remote boundary represents this as the ordinal
/// 1 (high) .. 3 (low); anything else maps to `Low`, matching the backend's
/// permissive handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl From<u8> for Priority {
    fn from(ordinal: u8) -> Self {
        match ordinal {
            1 => Priority::High,
            2 => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

// ============================================================================
// TaskStatus
// ============================================================================

/// Task lifecycle stage. Serialized as `"pending"` / `"in-progress"` /
/// `"completed"` at the remote boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// The checkbox flip: completed goes back to in-progress, anything else
    /// becomes completed.
    pub fn toggled(self) -> TaskStatus {
        match self {
            TaskStatus::Completed => TaskStatus::InProgress,
            _ => TaskStatus::Completed,
        }
    }
}

// ============================================================================
// TaskFields / TaskRecord
// ============================================================================

/// The non-identity fields of a task — the payload of create and update
/// calls. Field-wise equality is what reconciliation compares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    /// Non-empty display text.
    pub title: String,
    /// May be empty.
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub deadline: Option<DateTime<Utc>>,
}

impl Default for TaskFields {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::Low,
            status: TaskStatus::Pending,
            deadline: None,
        }
    }
}

/// A task as it exists in a snapshot: remote-minted identity plus fields.
/// Identity is compared by `id`; reconciliation equality is field-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(flatten)]
    pub fields: TaskFields,
}

impl TaskRecord {
    pub fn new(id: impl Into<TaskId>, fields: TaskFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
