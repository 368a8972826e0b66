//! Reconciliation: applying a plan against the remote store, and the
//! undo/redo controller that orchestrates the history stacks around it.

mod applier;
mod controller;
pub mod types;

pub use applier::apply;
pub use controller::Controller;
pub use types::{ControllerEvent, ControllerOptions, EventCallback};
