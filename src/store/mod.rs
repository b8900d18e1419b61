// src/store/mod.rs

//! Durable persistence for elements, wheel entries and status markers.
//!
//! The orchestrator only talks to [`DurableStore`]. Failures are reported to
//! the error handler by the caller; the store never retries on its own.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::element::{ElementId, ElementRecord, Status, WorkflowId};
use crate::errors::{DagwheelError, Result};
use crate::wheel::Buckets;

/// Everything [`DurableStore::load_all`] read back. Rows that could not be
/// decoded are kept as errors next to the healthy records.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<ElementRecord>,
    pub failures: Vec<DagwheelError>,
}

#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Insert or overwrite the record under its id.
    async fn put(&self, record: &ElementRecord) -> Result<()>;

    async fn delete(&self, id: ElementId) -> Result<()>;

    /// Every stored record. Only a failure to read the store at all is an
    /// `Err`; a single bad row ends up in [`LoadedRecords::failures`].
    async fn load_all(&self) -> Result<LoadedRecords>;

    /// Move the workflow index entry of `id` from `old` to `new`.
    async fn swap_status_marker(
        &self,
        workflow_id: WorkflowId,
        id: ElementId,
        old: Option<Status>,
        new: Status,
    ) -> Result<()>;

    async fn remove_status_marker(&self, workflow_id: WorkflowId, id: ElementId) -> Result<()>;

    /// Current status of every element of a workflow, per its markers.
    async fn workflow_markers(&self, workflow_id: WorkflowId) -> Result<BTreeMap<ElementId, Status>>;

    async fn add_wheel_entry(&self, cycle: u32, id: ElementId, status: Status) -> Result<()>;

    async fn remove_wheel_entry(&self, cycle: u32, id: ElementId, status: Status) -> Result<()>;

    /// Drop every entry of `id` in bucket `cycle`.
    async fn force_remove_wheel_entry(&self, cycle: u32, id: ElementId) -> Result<()>;

    /// The persisted wheel: cycle → (id, status) entries.
    async fn load_status_markers(&self) -> Result<Buckets>;
}
