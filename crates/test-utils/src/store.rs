use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dagwheel::element::{ElementId, ElementRecord, Status, WorkflowId};
use dagwheel::errors::{DagwheelError, Result};
use dagwheel::store::{DurableStore, LoadedRecords, MemoryStore};
use dagwheel::wheel::Buckets;

/// A [`MemoryStore`] that counts writes and can be told to fail them.
#[derive(Debug, Clone, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Write attempts so far, failed ones included.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn write(&self) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(DagwheelError::Store("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DurableStore for FaultyStore {
    async fn put(&self, record: &ElementRecord) -> Result<()> {
        self.write()?;
        self.inner.put(record).await
    }

    async fn delete(&self, id: ElementId) -> Result<()> {
        self.write()?;
        self.inner.delete(id).await
    }

    async fn load_all(&self) -> Result<LoadedRecords> {
        self.inner.load_all().await
    }

    async fn swap_status_marker(
        &self,
        workflow_id: WorkflowId,
        id: ElementId,
        old: Option<Status>,
        new: Status,
    ) -> Result<()> {
        self.write()?;
        self.inner.swap_status_marker(workflow_id, id, old, new).await
    }

    async fn remove_status_marker(&self, workflow_id: WorkflowId, id: ElementId) -> Result<()> {
        self.write()?;
        self.inner.remove_status_marker(workflow_id, id).await
    }

    async fn workflow_markers(&self, workflow_id: WorkflowId) -> Result<BTreeMap<ElementId, Status>> {
        self.inner.workflow_markers(workflow_id).await
    }

    async fn add_wheel_entry(&self, cycle: u32, id: ElementId, status: Status) -> Result<()> {
        self.write()?;
        self.inner.add_wheel_entry(cycle, id, status).await
    }

    async fn remove_wheel_entry(&self, cycle: u32, id: ElementId, status: Status) -> Result<()> {
        self.write()?;
        self.inner.remove_wheel_entry(cycle, id, status).await
    }

    async fn force_remove_wheel_entry(&self, cycle: u32, id: ElementId) -> Result<()> {
        self.write()?;
        self.inner.force_remove_wheel_entry(cycle, id).await
    }

    async fn load_status_markers(&self) -> Result<Buckets> {
        self.inner.load_status_markers().await
    }
}
