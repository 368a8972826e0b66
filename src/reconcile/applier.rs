//! Reconciliation applier — turns a plan into remote calls.
//!
//! Operations within and across the three sets are independent (each
//! targets a distinct or fully-specified record), so they are dispatched
//! without mutual ordering and their completion is awaited jointly. There is
//! no cancellation: a dispatched batch runs to completion.

use futures::future::{join_all, BoxFuture};

use crate::error::{FailedOperation, ReconciliationFailure};
use crate::plan::{PlannedOp, ReconciliationPlan};
use crate::remote::RemoteStore;

/// Apply `plan` against `store`.
///
/// Creates send the record's non-identity fields (the store mints a new
/// id); deletes go by id; updates send the full field set. If every call
/// succeeds the result is `Ok(())`. If one or more fail, the result carries
/// the failed operations — calls that already succeeded are NOT compensated
/// or rolled back. That is a deliberate simplicity-over-atomicity policy;
/// resubmit [`ReconciliationFailure::retry_plan`] to converge.
pub async fn apply(
    plan: &ReconciliationPlan,
    store: &dyn RemoteStore,
) -> Result<(), ReconciliationFailure> {
    let mut ops: Vec<BoxFuture<'_, Option<FailedOperation>>> = Vec::new();

    for record in &plan.to_create {
        ops.push(Box::pin(async move {
            store.create(&record.fields).await.err().map(|error| FailedOperation {
                op: PlannedOp::Create(record.clone()),
                error,
            })
        }));
    }

    for record in &plan.to_update {
        ops.push(Box::pin(async move {
            store
                .update(&record.id, &record.fields)
                .await
                .err()
                .map(|error| FailedOperation {
                    op: PlannedOp::Update(record.clone()),
                    error,
                })
        }));
    }

    for id in &plan.to_delete {
        ops.push(Box::pin(async move {
            store.delete(id).await.err().map(|error| FailedOperation {
                op: PlannedOp::Delete(id.clone()),
                error,
            })
        }));
    }

    let attempted = ops.len();
    let failed: Vec<FailedOperation> = join_all(ops).await.into_iter().flatten().collect();

    if failed.is_empty() {
        Ok(())
    } else {
        tracing::warn!(
            failed = failed.len(),
            attempted,
            "reconciliation batch partially failed; succeeded operations are not rolled back"
        );
        Err(ReconciliationFailure { failed, attempted })
    }
}
