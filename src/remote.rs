//! RemoteStore — the external adapter boundary.
//!
//! Implementations wrap whatever actually talks to the authoritative
//! backend (HTTP client, test double, etc.). Individual-call timeouts are
//! the implementation's responsibility; the core treats every error
//! uniformly as "this operation did not take effect" and never retries.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::types::{Snapshot, TaskFields, TaskId};

/// User-implemented adapter over the authoritative task store.
///
/// Must be `Send + Sync` — the controller holds it behind `Arc<dyn
/// RemoteStore>` and dispatches reconciliation batch calls concurrently.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create a record from its non-identity fields. The store mints and
    /// returns the new identity; ids are never assigned locally.
    async fn create(&self, fields: &TaskFields) -> Result<TaskId, AdapterError>;

    /// Replace the full field set of an existing record.
    async fn update(&self, id: &TaskId, fields: &TaskFields) -> Result<(), AdapterError>;

    /// Delete a record by id.
    async fn delete(&self, id: &TaskId) -> Result<(), AdapterError>;

    /// Fetch the full collection in the store's canonical order.
    async fn list_all(&self) -> Result<Snapshot, AdapterError>;
}
