//! Controller tests — mutation flows, undo/redo state machine, Busy
//! rejection, failure restoration, events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use task_rewind::error::{AdapterError, RewindError};
use task_rewind::reconcile::{Controller, ControllerEvent, ControllerOptions};
use task_rewind::remote::RemoteStore;
use task_rewind::types::{Snapshot, TaskFields, TaskId, TaskStatus};

use super::mock::{task, Call, MockStore};

fn controller_over(store: Arc<MockStore>) -> Controller {
    Controller::new(ControllerOptions::new(store))
}

// ----------------------------------------------------------------------------
// Direct mutations
// ----------------------------------------------------------------------------

#[tokio::test]
async fn refresh_adopts_the_remote_collection() {
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("t1", "one")]);
    let controller = controller_over(store);

    assert!(controller.current().is_empty());
    controller.refresh().await.unwrap();
    assert_eq!(controller.current(), vec![task("t1", "one")]);
}

#[tokio::test]
async fn create_records_history_and_refreshes() {
    let store = Arc::new(MockStore::new());
    let controller = controller_over(store.clone());
    controller.refresh().await.unwrap();

    let fields = TaskFields {
        title: "new".to_string(),
        ..TaskFields::default()
    };
    let id = controller.create_task(fields).await.unwrap();

    assert!(controller.can_undo());
    assert!(!controller.can_redo());
    let current = controller.current();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, id);
}

#[tokio::test]
async fn failed_mutation_keeps_a_noop_history_point() {
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("t1", "one")]);
    let controller = controller_over(store.clone());
    controller.refresh().await.unwrap();

    store.fail_create(AdapterError::new("rejected"));
    let err = controller
        .create_task(TaskFields::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RewindError::Adapter(_)));

    // The pre-action snapshot was pushed before the call failed; since the
    // mutation never happened, undoing it is itself a no-op.
    assert!(controller.can_undo());
    store.clear_failures();
    store.clear_calls();
    controller.undo().await.unwrap();
    assert!(store.calls().is_empty());
    assert_eq!(controller.current(), vec![task("t1", "one")]);
}

#[tokio::test]
async fn toggle_flips_status_and_issues_a_single_update() {
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("t1", "one")]);
    let controller = controller_over(store.clone());
    controller.refresh().await.unwrap();
    store.clear_calls();

    let status = controller.toggle_status(&"t1".to_string()).await.unwrap();
    assert_eq!(status, TaskStatus::Completed);
    assert_eq!(
        controller.current()[0].fields.status,
        TaskStatus::Completed
    );

    // One direct update plus the refresh — not a reconciliation batch.
    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], Call::Update(ref id, ref f)
        if id == "t1" && f.status == TaskStatus::Completed));
    assert_eq!(calls[1], Call::ListAll);
}

#[tokio::test]
async fn toggle_on_unknown_id_fails_without_touching_the_store() {
    let store = Arc::new(MockStore::new());
    let controller = controller_over(store.clone());
    store.clear_calls();

    let err = controller.toggle_status(&"ghost".to_string()).await.unwrap_err();
    assert!(matches!(err, RewindError::UnknownTask(ref id) if id == "ghost"));
    assert!(store.calls().is_empty());
    assert!(!controller.can_undo());
}

#[tokio::test]
async fn history_capacity_overflow_surfaces_before_the_remote_call() {
    let store = Arc::new(MockStore::new());
    let mut options = ControllerOptions::new(store.clone());
    options.capacity = Some(1);
    let controller = Controller::new(options);

    controller.create_task(TaskFields::default()).await.unwrap();
    let err = controller
        .create_task(TaskFields::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RewindError::History(_)));

    // Only the first create reached the store.
    let creates = store
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Create(_)))
        .count();
    assert_eq!(creates, 1);
}

// ----------------------------------------------------------------------------
// Undo / Redo
// ----------------------------------------------------------------------------

#[tokio::test]
async fn toggle_undo_redo_scenario() {
    // current = [{id:1, status:pending}]; mark completed; undo; redo.
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("1", "one")]);
    let controller = controller_over(store.clone());
    controller.refresh().await.unwrap();

    controller.toggle_status(&"1".to_string()).await.unwrap();
    assert_eq!(controller.current()[0].fields.status, TaskStatus::Completed);
    assert!(controller.can_undo());

    controller.undo().await.unwrap();
    assert_eq!(controller.current()[0].fields.status, TaskStatus::Pending);
    assert_eq!(store.records()[0].fields.status, TaskStatus::Pending);
    assert!(controller.can_redo());

    controller.redo().await.unwrap();
    assert_eq!(controller.current()[0].fields.status, TaskStatus::Completed);
    assert_eq!(store.records()[0].fields.status, TaskStatus::Completed);
}

#[tokio::test]
async fn undo_then_redo_restores_the_exact_pre_undo_state() {
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("t1", "one"), task("t2", "two")]);
    let controller = controller_over(store.clone());
    controller.refresh().await.unwrap();

    let mut renamed = task("t1", "one").fields;
    renamed.title = "renamed".to_string();
    controller.update_task(&"t1".to_string(), renamed).await.unwrap();
    let before_undo = controller.current();

    controller.undo().await.unwrap();
    assert_ne!(controller.current(), before_undo);
    controller.redo().await.unwrap();
    assert_eq!(controller.current(), before_undo);
    assert_eq!(store.records(), before_undo);
}

#[tokio::test]
async fn undo_on_empty_history_is_a_noop() {
    let store = Arc::new(MockStore::new());
    let controller = controller_over(store.clone());
    store.clear_calls();

    assert!(!controller.can_undo());
    controller.undo().await.unwrap();
    controller.redo().await.unwrap();
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn direct_mutation_clears_the_redo_history() {
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("t1", "one")]);
    let controller = controller_over(store.clone());
    controller.refresh().await.unwrap();

    controller.toggle_status(&"t1".to_string()).await.unwrap();
    controller.undo().await.unwrap();
    assert!(controller.can_redo());

    controller.toggle_status(&"t1".to_string()).await.unwrap();
    assert!(!controller.can_redo());
}

#[tokio::test]
async fn failed_undo_restores_the_stack_shape_and_keeps_current() {
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("t1", "one"), task("t2", "two")]);
    let controller = controller_over(store.clone());
    controller.refresh().await.unwrap();

    // History says the collection used to be just [t1]; undoing plans a
    // delete of t2, which we make fail.
    controller.record_mutation(vec![task("t1", "one")]).unwrap();
    store.fail_delete("t2", AdapterError::new("timeout"));

    let err = controller.undo().await.unwrap_err();
    assert!(matches!(err, RewindError::Reconciliation(_)));
    assert!(controller.can_undo(), "undo entry must be restored");
    assert!(!controller.can_redo(), "staged redo entry must be discarded");
    assert_eq!(controller.current().len(), 2, "current must be unchanged");

    // Once the store recovers, the same undo goes through.
    store.clear_failures();
    controller.undo().await.unwrap();
    assert_eq!(controller.current(), vec![task("t1", "one")]);
    assert_eq!(store.records(), vec![task("t1", "one")]);
    assert!(controller.can_redo());
}

// ----------------------------------------------------------------------------
// Busy rejection
// ----------------------------------------------------------------------------

/// A store whose `update` blocks until released, to hold an undo in flight.
/// The next released update can be made to fail instead of applying.
struct GatedStore {
    records: Mutex<Snapshot>,
    gate: tokio::sync::Semaphore,
    fail_update: Mutex<Option<AdapterError>>,
}

impl GatedStore {
    fn new(records: Snapshot) -> Self {
        Self {
            records: Mutex::new(records),
            gate: tokio::sync::Semaphore::new(0),
            fail_update: Mutex::new(None),
        }
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }

    fn fail_next_update(&self, error: AdapterError) {
        *self.fail_update.lock() = Some(error);
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn create(&self, _fields: &TaskFields) -> Result<TaskId, AdapterError> {
        Err(AdapterError::new("not used"))
    }

    async fn update(&self, id: &TaskId, fields: &TaskFields) -> Result<(), AdapterError> {
        self.gate.acquire().await.unwrap().forget();
        if let Some(error) = self.fail_update.lock().take() {
            return Err(error);
        }
        let mut records = self.records.lock();
        if let Some(record) = records.iter_mut().find(|r| &r.id == id) {
            record.fields = fields.clone();
        }
        Ok(())
    }

    async fn delete(&self, _id: &TaskId) -> Result<(), AdapterError> {
        Err(AdapterError::new("not used"))
    }

    async fn list_all(&self) -> Result<Snapshot, AdapterError> {
        Ok(self.records.lock().clone())
    }
}

#[tokio::test]
async fn undo_is_rejected_while_another_is_in_flight() {
    let mut completed = task("t1", "one");
    completed.fields.status = TaskStatus::Completed;

    let store = Arc::new(GatedStore::new(vec![completed]));
    let controller = Arc::new(Controller::new(ControllerOptions::new(store.clone())));
    controller.refresh().await.unwrap();
    controller.record_mutation(vec![task("t1", "one")]).unwrap();

    let in_flight = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.undo().await })
    };
    // Let the spawned undo reach the blocked update call.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = controller.undo().await.unwrap_err();
    assert!(matches!(err, RewindError::Busy));

    store.release();
    in_flight.await.unwrap().unwrap();
    assert_eq!(controller.current()[0].fields.status, TaskStatus::Pending);

    // Idle again: a further undo is accepted (and is a no-op — the stack
    // is empty now).
    controller.undo().await.unwrap();
}

#[tokio::test]
async fn mutation_during_inflight_undo_does_not_mask_its_failure() {
    let mut completed = task("t1", "one");
    completed.fields.status = TaskStatus::Completed;

    let store = Arc::new(GatedStore::new(vec![completed.clone()]));
    let controller = Arc::new(Controller::new(ControllerOptions::new(store.clone())));
    controller.refresh().await.unwrap();
    controller.record_mutation(vec![task("t1", "one")]).unwrap();
    store.fail_next_update(AdapterError::new("timeout"));

    let in_flight = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.undo().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Direct mutations are not gated by the in-flight undo; recording one
    // clears the redo history, taking the staged return entry with it.
    controller.record_mutation(controller.current()).unwrap();

    store.release();
    let err = in_flight.await.unwrap().unwrap_err();
    assert!(
        matches!(err, RewindError::Reconciliation(_)),
        "the store failure must come back, not a history error: {err}"
    );
    assert!(controller.can_undo(), "undone entry must be restored");
    assert_eq!(controller.current(), vec![completed]);

    // The restored entry is still usable once the store recovers.
    store.release();
    controller.undo().await.unwrap();
    assert_eq!(controller.current(), vec![task("t1", "one")]);
}

// ----------------------------------------------------------------------------
// Events
// ----------------------------------------------------------------------------

#[tokio::test]
async fn events_are_delivered_for_undo_redo_and_failures() {
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("t1", "one")]);

    let events: Arc<Mutex<Vec<ControllerEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut options = ControllerOptions::new(store.clone());
    options.on_event = Some(Arc::new(move |event: &ControllerEvent| {
        sink.lock().push(event.clone());
    }));
    let controller = Controller::new(options);
    controller.refresh().await.unwrap();

    controller.toggle_status(&"t1".to_string()).await.unwrap();
    controller.undo().await.unwrap();
    controller.redo().await.unwrap();

    store.fail_update("t1", AdapterError::new("down"));
    let _ = controller.toggle_status(&"t1".to_string()).await;

    let seen = events.lock().clone();
    assert!(matches!(
        seen[0],
        ControllerEvent::StatusToggled { ref id, status }
            if id == "t1" && status == TaskStatus::Completed
    ));
    assert_eq!(seen[1], ControllerEvent::UndoApplied);
    assert_eq!(seen[2], ControllerEvent::RedoApplied);
    assert!(matches!(seen[3], ControllerEvent::OperationFailed { .. }));
}

#[tokio::test]
async fn refresh_failure_after_a_successful_mutation_reaches_the_observer() {
    let store = Arc::new(MockStore::new());
    store.seed(vec![task("t1", "one")]);

    let events: Arc<Mutex<Vec<ControllerEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut options = ControllerOptions::new(store.clone());
    options.on_event = Some(Arc::new(move |event: &ControllerEvent| {
        sink.lock().push(event.clone());
    }));
    let controller = Controller::new(options);
    controller.refresh().await.unwrap();

    // The update itself lands; only the follow-up list fails.
    store.fail_list(AdapterError::new("flaky"));
    let err = controller.toggle_status(&"t1".to_string()).await.unwrap_err();
    assert!(matches!(err, RewindError::Adapter(_)));
    assert_eq!(store.records()[0].fields.status, TaskStatus::Completed);

    let seen = events.lock().clone();
    assert_eq!(seen.len(), 1);
    assert!(matches!(seen[0], ControllerEvent::OperationFailed { .. }));
}
