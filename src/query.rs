//! In-memory queries over a snapshot — search, filter, sort.
//!
//! Pure scan-and-filter: the engine owns the current snapshot, so the list
//! views (search box, status/deadline filters, sort bar) run locally
//! instead of round-tripping to the store.

use chrono::{DateTime, Utc};

use crate::types::{Snapshot, TaskRecord, TaskStatus};

// ============================================================================
// Sort types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Which field to order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Missing deadlines order last regardless of direction.
    Deadline,
    Priority,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

// ============================================================================
// TaskQuery
// ============================================================================

/// A query over a snapshot. All criteria are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Case-insensitive substring match on title or description.
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    /// Inclusive lower bound on deadline; records without one never match.
    pub due_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on deadline; records without one never match.
    pub due_before: Option<DateTime<Utc>>,
    pub sort: Option<SortSpec>,
}

impl TaskQuery {
    /// Filter then sort. Returns a new vec; the snapshot is not mutated.
    /// The sort is stable, so equal keys keep snapshot order.
    pub fn execute(&self, snapshot: &Snapshot) -> Vec<TaskRecord> {
        let mut records: Vec<TaskRecord> = snapshot
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();

        if let Some(sort) = self.sort {
            records.sort_by(|a, b| {
                let cmp = match sort.key {
                    SortKey::Deadline => match (a.fields.deadline, b.fields.deadline) {
                        (Some(da), Some(db)) => da.cmp(&db),
                        (Some(_), None) => return std::cmp::Ordering::Less,
                        (None, Some(_)) => return std::cmp::Ordering::Greater,
                        (None, None) => std::cmp::Ordering::Equal,
                    },
                    SortKey::Priority => a.fields.priority.cmp(&b.fields.priority),
                    SortKey::Title => a
                        .fields
                        .title
                        .to_lowercase()
                        .cmp(&b.fields.title.to_lowercase()),
                };
                if sort.direction == SortDirection::Desc {
                    cmp.reverse()
                } else {
                    cmp
                }
            });
        }

        records
    }

    fn matches(&self, record: &TaskRecord) -> bool {
        if let Some(ref term) = self.search {
            let needle = term.to_lowercase();
            if !record.fields.title.to_lowercase().contains(&needle)
                && !record.fields.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.fields.status != status {
                return false;
            }
        }
        if self.due_after.is_some() || self.due_before.is_some() {
            let Some(deadline) = record.fields.deadline else {
                return false;
            };
            if let Some(after) = self.due_after {
                if deadline < after {
                    return false;
                }
            }
            if let Some(before) = self.due_before {
                if deadline > before {
                    return false;
                }
            }
        }
        true
    }
}
