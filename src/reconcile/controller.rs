//! Undo/redo controller — owns the two history stacks and the current
//! snapshot, single source of truth for the session's collection state.
//!
//! One logical thread of control per session: state is mutated only between
//! awaits, and the interior mutex is never held across one. The only
//! genuine concurrency is inside a reconciliation batch (see the applier).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{HistoryError, Result, RewindError};
use crate::history::{BoundedStack, DEFAULT_CAPACITY};
use crate::plan::diff;
use crate::remote::RemoteStore;
use crate::types::{Snapshot, TaskFields, TaskId, TaskStatus};

use super::applier::apply;
use super::types::{ControllerEvent, ControllerOptions, EventCallback};

/// Everything guarded by the controller's mutex. The two stacks and the
/// current snapshot are owned exclusively here; no other component mutates
/// them.
struct ControllerState {
    current: Snapshot,
    undo: BoundedStack<Snapshot>,
    redo: BoundedStack<Snapshot>,
}

/// Which direction a history operation moves in. Undo and redo are mirror
/// images; `shift` handles both with the stack roles swapped.
#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Undo,
    Redo,
}

pub struct Controller {
    store: Arc<dyn RemoteStore>,
    state: Mutex<ControllerState>,
    /// True while an undo/redo reconciliation is in flight. Direct
    /// mutations are not gated by this — they operate on the live
    /// collection directly.
    busy: AtomicBool,
    on_event: Option<Arc<EventCallback>>,
}

impl Controller {
    pub fn new(options: ControllerOptions) -> Self {
        let capacity = options.capacity.unwrap_or(DEFAULT_CAPACITY);
        Self {
            store: options.store,
            state: Mutex::new(ControllerState {
                current: Vec::new(),
                undo: BoundedStack::with_capacity(capacity),
                redo: BoundedStack::with_capacity(capacity),
            }),
            busy: AtomicBool::new(false),
            on_event: options.on_event,
        }
    }

    // -----------------------------------------------------------------------
    // State access
    // -----------------------------------------------------------------------

    /// Clone of the current snapshot.
    pub fn current(&self) -> Snapshot {
        self.state.lock().current.clone()
    }

    pub fn can_undo(&self) -> bool {
        !self.state.lock().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.state.lock().redo.is_empty()
    }

    /// Refetch the collection from the store and adopt it as current.
    pub async fn refresh(&self) -> Result<()> {
        let snapshot = self.store.list_all().await?;
        self.state.lock().current = snapshot;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Direct mutations
    // -----------------------------------------------------------------------

    /// Refresh after a remote call already took effect. A failure here means
    /// the mutation landed but the local view is stale, so the observer hears
    /// about it the same way it hears about a failed call.
    async fn refresh_or_report(&self) -> Result<()> {
        if let Err(error) = self.refresh().await {
            self.emit_failure(&error.to_string());
            return Err(error);
        }
        Ok(())
    }

    /// Record the pre-mutation snapshot: push it onto the undo history and
    /// clear the redo history (a new forward action invalidates it).
    pub fn record_mutation(&self, before: Snapshot) -> Result<(), HistoryError> {
        let mut state = self.state.lock();
        state.undo.push(before)?;
        state.redo.clear();
        Ok(())
    }

    /// Create a task remotely and refresh. The pre-action snapshot is
    /// recorded first; if the remote call fails, that entry remains — the
    /// mutation never happened, so it is a harmless no-op history point.
    pub async fn create_task(&self, fields: TaskFields) -> Result<TaskId> {
        self.record_mutation(self.current())?;
        match self.store.create(&fields).await {
            Ok(id) => {
                self.refresh_or_report().await?;
                self.emit(&ControllerEvent::Mutated { id: id.clone() });
                Ok(id)
            }
            Err(error) => {
                self.emit_failure(&error.to_string());
                Err(error.into())
            }
        }
    }

    /// Replace a task's full field set remotely and refresh.
    pub async fn update_task(&self, id: &TaskId, fields: TaskFields) -> Result<()> {
        self.record_mutation(self.current())?;
        match self.store.update(id, &fields).await {
            Ok(()) => {
                self.refresh_or_report().await?;
                self.emit(&ControllerEvent::Mutated { id: id.clone() });
                Ok(())
            }
            Err(error) => {
                self.emit_failure(&error.to_string());
                Err(error.into())
            }
        }
    }

    /// Delete a task remotely and refresh.
    pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
        self.record_mutation(self.current())?;
        match self.store.delete(id).await {
            Ok(()) => {
                self.refresh_or_report().await?;
                self.emit(&ControllerEvent::Mutated { id: id.clone() });
                Ok(())
            }
            Err(error) => {
                self.emit_failure(&error.to_string());
                Err(error.into())
            }
        }
    }

    /// The checkbox flip: completed goes back to in-progress, anything else
    /// becomes completed. Issues a full-field update for the flipped record.
    pub async fn toggle_status(&self, id: &TaskId) -> Result<TaskStatus> {
        let fields = {
            let state = self.state.lock();
            let record = state
                .current
                .iter()
                .find(|r| &r.id == id)
                .ok_or_else(|| RewindError::UnknownTask(id.clone()))?;
            let mut fields = record.fields.clone();
            fields.status = fields.status.toggled();
            fields
        };
        let status = fields.status;

        self.record_mutation(self.current())?;
        match self.store.update(id, &fields).await {
            Ok(()) => {
                self.refresh_or_report().await?;
                self.emit(&ControllerEvent::StatusToggled {
                    id: id.clone(),
                    status,
                });
                Ok(status)
            }
            Err(error) => {
                self.emit_failure(&error.to_string());
                Err(error.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Undo / Redo
    // -----------------------------------------------------------------------

    /// Revert the collection to the most recent history point.
    ///
    /// No-op `Ok(())` when there is nothing to undo ([`Controller::can_undo`]
    /// is the preflight). Rejected with [`RewindError::Busy`] while another
    /// undo/redo is in flight. On reconciliation failure the stacks are
    /// restored to their pre-undo shape and the failure is returned; calls
    /// that succeeded inside the batch are not compensated, so the store and
    /// the local view can diverge until a retry converges them.
    pub async fn undo(&self) -> Result<()> {
        self.shift(Direction::Undo).await
    }

    /// Mirror of [`Controller::undo`], replaying the most recently undone
    /// history point.
    pub async fn redo(&self) -> Result<()> {
        self.shift(Direction::Redo).await
    }

    async fn shift(&self, direction: Direction) -> Result<()> {
        let _busy = self.enter_busy()?;

        // Pop the target and stage the current snapshot on the opposite
        // stack before any remote work, so a mid-flight observer sees a
        // consistent history shape.
        let (current, target) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let (from, to) = match direction {
                Direction::Undo => (&mut state.undo, &mut state.redo),
                Direction::Redo => (&mut state.redo, &mut state.undo),
            };
            if from.is_empty() {
                return Ok(());
            }
            let target = from.pop()?;
            if let Err(e) = to.push(state.current.clone()) {
                // Could not stage the return entry; put the target back so
                // the history is exactly as before the call.
                from.push(target)?;
                return Err(e.into());
            }
            (state.current.clone(), target)
        };

        let plan = diff(&current, &target);
        let is_redo = direction == Direction::Redo;
        tracing::debug!(
            creates = plan.to_create.len(),
            updates = plan.to_update.len(),
            deletes = plan.to_delete.len(),
            redo = is_redo,
            "reconciling history shift"
        );

        match apply(&plan, self.store.as_ref()).await {
            Ok(()) => {
                self.state.lock().current = target;
                self.emit(match direction {
                    Direction::Undo => &ControllerEvent::UndoApplied,
                    Direction::Redo => &ControllerEvent::RedoApplied,
                });
                Ok(())
            }
            Err(failure) => {
                // Restore the pre-operation stack shape: discard the staged
                // return entry and put the popped target back. Best effort,
                // since a direct mutation recorded while the batch was in
                // flight may have cleared the staged entry or filled the
                // stack, and neither outcome may mask the batch failure.
                {
                    let mut guard = self.state.lock();
                    let state = &mut *guard;
                    let (from, to) = match direction {
                        Direction::Undo => (&mut state.undo, &mut state.redo),
                        Direction::Redo => (&mut state.redo, &mut state.undo),
                    };
                    let _ = to.pop();
                    if let Err(e) = from.push(target) {
                        tracing::warn!(
                            error = %e,
                            "could not restore the history entry after a failed reconciliation"
                        );
                    }
                }
                self.emit_failure(&failure.to_string());
                Err(failure.into())
            }
        }
    }

    fn enter_busy(&self) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .map_err(|_| RewindError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    fn emit(&self, event: &ControllerEvent) {
        if let Some(ref on_event) = self.on_event {
            // Swallow observer panics — they must not break the operation.
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                on_event(event);
            }));
        }
    }

    fn emit_failure(&self, message: &str) {
        self.emit(&ControllerEvent::OperationFailed {
            message: message.to_string(),
        });
    }
}

/// Clears the busy flag when the in-flight undo/redo finishes, on every
/// exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
