//! Snapshot differ — pure, deterministic, no I/O.

use std::collections::HashMap;

use crate::types::{Snapshot, TaskRecord};

use super::ReconciliationPlan;

/// Compute the operations that make a remote store holding `current` match
/// `target`.
///
/// Matching is strictly by `id`. A record that was deleted and later
/// recreated through reconciliation carries a fresh store-minted id and is
/// treated as distinct from its predecessor: diffing against a snapshot that
/// still references the old id plans a delete+create pair, never a content
/// match.
///
/// Set ordering is deterministic: `to_create` and `to_update` follow
/// `target` sequence order, `to_delete` follows `current` sequence order.
pub fn diff(current: &Snapshot, target: &Snapshot) -> ReconciliationPlan {
    let current_by_id: HashMap<&str, &TaskRecord> =
        current.iter().map(|r| (r.id.as_str(), r)).collect();
    let target_ids: std::collections::HashSet<&str> =
        target.iter().map(|r| r.id.as_str()).collect();

    let mut plan = ReconciliationPlan::default();

    for record in target {
        match current_by_id.get(record.id.as_str()) {
            None => plan.to_create.push(record.clone()),
            Some(existing) => {
                if existing.fields != record.fields {
                    plan.to_update.push(record.clone());
                }
            }
        }
    }

    for record in current {
        if !target_ids.contains(record.id.as_str()) {
            plan.to_delete.push(record.id.clone());
        }
    }

    plan
}
