// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::{DurableStore, LoadedRecords};
use crate::element::{ElementId, ElementRecord, Status, WorkflowId};
use crate::errors::Result;
use crate::sync::lock;
use crate::wheel::Buckets;

#[derive(Debug, Default)]
struct MemoryState {
    elements: BTreeMap<ElementId, ElementRecord>,
    wheel: Buckets,
    markers: BTreeMap<WorkflowId, BTreeMap<ElementId, Status>>,
}

/// In-process store.
///
/// Clones share state, so a test can hand one clone to an orchestrator and
/// keep another to inspect or to "restart" with.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: ElementId) -> Option<ElementRecord> {
        lock(&self.state).elements.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn wheel(&self) -> Buckets {
        lock(&self.state).wheel.clone()
    }

    pub fn marker(&self, workflow_id: WorkflowId, id: ElementId) -> Option<Status> {
        lock(&self.state)
            .markers
            .get(&workflow_id)
            .and_then(|m| m.get(&id))
            .copied()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn put(&self, record: &ElementRecord) -> Result<()> {
        lock(&self.state).elements.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: ElementId) -> Result<()> {
        lock(&self.state).elements.remove(&id);
        Ok(())
    }

    async fn load_all(&self) -> Result<LoadedRecords> {
        Ok(LoadedRecords {
            records: lock(&self.state).elements.values().cloned().collect(),
            failures: Vec::new(),
        })
    }

    async fn swap_status_marker(
        &self,
        workflow_id: WorkflowId,
        id: ElementId,
        old: Option<Status>,
        new: Status,
    ) -> Result<()> {
        let mut state = lock(&self.state);
        let previous = state.markers.entry(workflow_id).or_default().insert(id, new);
        if previous != old {
            debug!(element = %id, ?previous, ?old, ?new, "status marker was not in the expected state");
        }
        Ok(())
    }

    async fn remove_status_marker(&self, workflow_id: WorkflowId, id: ElementId) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(markers) = state.markers.get_mut(&workflow_id) {
            markers.remove(&id);
            if markers.is_empty() {
                state.markers.remove(&workflow_id);
            }
        }
        Ok(())
    }

    async fn workflow_markers(&self, workflow_id: WorkflowId) -> Result<BTreeMap<ElementId, Status>> {
        Ok(lock(&self.state)
            .markers
            .get(&workflow_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_wheel_entry(&self, cycle: u32, id: ElementId, status: Status) -> Result<()> {
        lock(&self.state)
            .wheel
            .entry(cycle)
            .or_default()
            .insert((id, status));
        Ok(())
    }

    async fn remove_wheel_entry(&self, cycle: u32, id: ElementId, status: Status) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(bucket) = state.wheel.get_mut(&cycle) {
            bucket.remove(&(id, status));
            if bucket.is_empty() {
                state.wheel.remove(&cycle);
            }
        }
        Ok(())
    }

    async fn force_remove_wheel_entry(&self, cycle: u32, id: ElementId) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(bucket) = state.wheel.get_mut(&cycle) {
            bucket.retain(|(entry_id, _)| *entry_id != id);
            if bucket.is_empty() {
                state.wheel.remove(&cycle);
            }
        }
        Ok(())
    }

    async fn load_status_markers(&self) -> Result<Buckets> {
        Ok(lock(&self.state).wheel.clone())
    }
}
