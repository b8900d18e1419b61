// src/orchestrator/mod.rs

//! The orchestrator owns every live element and the scheduling wheel.
//!
//! One scheduler task calls [`Orchestrator::tick`]; element executions run
//! on an [`ExecutorBackend`] and report back through
//! [`Orchestrator::record_result`] and [`Orchestrator::recall`]. Each
//! collection has its own lock and no lock is held across an `.await`, so a
//! worker may finish while a tick is in progress.
//!
//! Store writes are attempted after the in-memory change has been applied.
//! A failing write is reported to the [`ErrorHandler`] and does not roll
//! the memory state back.

mod handler;
mod protocol;
mod recovery;
mod table;
mod transitions;

pub use handler::{ErrorHandler, LogErrorHandler};
pub use recovery::RecoveryReport;

use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::element::{Element, ElementId, ElementProvider, ElementRecord, Status, check_name};
use crate::errors::{DagwheelError, Result};
use crate::exec::{ExecutorBackend, WorkerPool};
use crate::store::{DurableStore, MemoryStore};
use crate::wheel::{Buckets, SchedulingWheel};

use self::table::ElementTable;

/// Point-in-time copy of the orchestrator's memory state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Sorted by id.
    pub elements: Vec<ElementRecord>,
    pub wheel: Buckets,
}

pub struct Orchestrator {
    config: EngineConfig,
    store: Arc<dyn DurableStore>,
    provider: ElementProvider,
    handler: Arc<dyn ErrorHandler>,
    executor: Arc<dyn ExecutorBackend>,
    elements: ElementTable,
    wheel: SchedulingWheel,
    me: Weak<Orchestrator>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("elements", &self.elements.len())
            .field("counter", &self.wheel.counter())
            .finish_non_exhaustive()
    }
}

/// Assembles an [`Orchestrator`]. Anything not supplied falls back to an
/// in-memory store, an empty provider, [`LogErrorHandler`] and a
/// [`WorkerPool`] sized from the config.
pub struct OrchestratorBuilder {
    config: EngineConfig,
    store: Option<Arc<dyn DurableStore>>,
    provider: ElementProvider,
    handler: Option<Arc<dyn ErrorHandler>>,
    executor: Option<Arc<dyn ExecutorBackend>>,
}

impl OrchestratorBuilder {
    pub fn store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn provider(mut self, provider: ElementProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn ExecutorBackend>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> Arc<Orchestrator> {
        let OrchestratorBuilder {
            config,
            store,
            provider,
            handler,
            executor,
        } = self;
        let executor =
            executor.unwrap_or_else(|| Arc::new(WorkerPool::new(config.max_workers)));

        Arc::new_cyclic(|me| Orchestrator {
            store: store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            handler: handler.unwrap_or_else(|| Arc::new(LogErrorHandler)),
            executor,
            provider,
            config,
            elements: ElementTable::default(),
            wheel: SchedulingWheel::new(),
            me: me.clone(),
        })
    }
}

impl Orchestrator {
    pub fn builder(config: EngineConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            store: None,
            provider: ElementProvider::new(),
            handler: None,
            executor: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &ElementProvider {
        &self.provider
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// First phase of committing a new element: decide its initial status
    /// and persist it. The element is not visible to ticks until
    /// [`insert_buffered`](Self::insert_buffered).
    pub async fn commit(&self, element: &mut Element) -> Result<()> {
        if element.status() != Status::New {
            return Err(DagwheelError::InvalidTransition {
                id: element.id(),
                from: element.status(),
                to: Status::Ready,
            });
        }

        let status = if element.all_inputs_delivered() {
            Status::Ready
        } else {
            Status::Pending
        };
        {
            let record = element.record_mut();
            record.status = status;
            record.touch();
        }

        if element.is_persistent() {
            if status.is_enqueued_on_entry() {
                let cycle = self.cycle_for(element, status);
                self.report(self.store.add_wheel_entry(cycle, element.id(), status).await);
            }
            self.report(
                self.store
                    .swap_status_marker(element.workflow_id(), element.id(), None, status)
                    .await,
            );
            self.report(self.store.put(element.record()).await);
        }

        debug!(element = %element.id(), kind = element.type_name(), ?status, "element committed");
        Ok(())
    }

    /// Second phase of committing: make committed elements schedulable.
    ///
    /// Elements land in the shadow maps and are merged at the start of the
    /// next tick.
    pub fn insert_buffered(&self, elements: Vec<Element>) {
        let entries: Vec<(u32, ElementId, Status)> = elements
            .iter()
            .filter(|e| e.status().is_enqueued_on_entry())
            .map(|e| (self.cycle_for(e, e.status()), e.id(), e.status()))
            .collect();

        self.elements.insert_pending(elements);
        for (cycle, id, status) in entries {
            self.wheel.insert(cycle, id, status);
        }
    }

    /// Merge worker-side inserts into the live maps.
    pub fn flush_pending(&self) {
        self.wheel.flush_pending();
        self.elements.flush_pending();
    }

    /// One scheduler iteration. Returns whether any element was due.
    pub async fn tick(&self) -> bool {
        self.flush_pending();
        if self.wheel.is_empty() {
            return false;
        }

        let due = self.wheel.due();
        let mut found = false;
        for (cycle, ids) in due {
            for id in ids {
                found = true;
                self.schedule_one(cycle, id).await;
            }
        }
        found
    }

    async fn schedule_one(&self, cycle: u32, id: ElementId) {
        if self.elements.get(id).is_none() {
            warn!(element = %id, cycle, "wheel entry points at an unknown element; removing it");
            self.wheel.force_remove(cycle, id);
            self.report(self.store.force_remove_wheel_entry(cycle, id).await);
            return;
        }
        if let Err(e) = self.advance(id).await {
            self.handler.handle(&e);
        }
    }

    /// Store a business-logic result for a `Running` element and move it to
    /// `NotifyFinish`. An `expansion` is committed first, gated on this
    /// element.
    pub async fn record_result(
        &self,
        id: ElementId,
        value: Value,
        variables: Option<crate::element::Variables>,
        expansion: Option<crate::graph::GraphBuilder>,
    ) -> Result<()> {
        let status = self.status_of(id).ok_or(DagwheelError::ElementNotFound(id))?;
        if status != Status::Running {
            return Err(DagwheelError::InvalidTransition {
                id,
                from: status,
                to: Status::NotifyFinish,
            });
        }

        let mut expansion = expansion;
        let spawned = match expansion.as_mut() {
            Some(builder) => builder.gate_on(id)?,
            None => Vec::new(),
        };

        self.elements.update(id, |element| {
            let record = element.record_mut();
            record.value = Some(value);
            if let Some(vars) = variables {
                record.variables = vars;
            }
            for consumer in &spawned {
                record.out_edges.insert(*consumer, false);
            }
        });

        if let Some(builder) = expansion {
            builder.commit(self).await?;
        }

        self.transition(id, Status::Running, Status::NotifyFinish, |_| {})
            .await
            .map(|_| ())
    }

    /// Send a `Running`, recall-capable element back to `Ready`.
    ///
    /// Returns `false` when the element is not running or its type does not
    /// support recall.
    pub async fn recall(&self, id: ElementId) -> Result<bool> {
        self.recall_with(id, None).await
    }

    pub(crate) async fn recall_with(
        &self,
        id: ElementId,
        variables: Option<crate::element::Variables>,
    ) -> Result<bool> {
        let element = self.elements.get(id).ok_or(DagwheelError::ElementNotFound(id))?;
        if element.status() != Status::Running || !element.logic().is_recallable() {
            return Ok(false);
        }
        self.transition(id, Status::Running, Status::Ready, move |record| {
            if let Some(vars) = variables {
                record.variables = vars;
            }
        })
        .await?;
        Ok(true)
    }

    /// Update one variable of a live element and persist it.
    pub async fn set_variable(&self, id: ElementId, name: &str, value: Value) -> Result<()> {
        check_name(name)?;
        let updated = self
            .elements
            .update(id, |element| {
                let record = element.record_mut();
                record.variables.insert(name.to_string(), value);
                record.touch();
                element.clone()
            })
            .ok_or(DagwheelError::ElementNotFound(id))?;
        self.save(&updated).await;
        Ok(())
    }

    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.elements.get(id)
    }

    pub fn status_of(&self, id: ElementId) -> Option<Status> {
        self.elements.get(id).map(|e| e.status())
    }

    pub fn value_of(&self, id: ElementId) -> Option<Value> {
        self.elements.get(id).and_then(|e| e.value().cloned())
    }

    /// Wheel entries (cycle, status) currently held for `id`.
    pub fn wheel_entries(&self, id: ElementId) -> Vec<(u32, Status)> {
        self.wheel.entries_for(id)
    }

    pub fn counter(&self) -> u32 {
        self.wheel.counter()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Ids of live elements currently in `status`.
    pub fn elements_in(&self, status: Status) -> Vec<ElementId> {
        self.elements.ids_with(|e| e.status() == status)
    }

    /// No live element and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.elements.len() == 0 && self.wheel.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            elements: self.elements.records(),
            wheel: self.wheel.snapshot(),
        }
    }

    pub(crate) fn cycle_for(&self, element: &Element, status: Status) -> u32 {
        self.config
            .cycle_for(element.type_name(), &element.logic().cycles(), status)
    }

    pub(crate) fn report(&self, result: Result<()>) {
        if let Err(e) = result {
            self.handler.handle(&e);
        }
    }

    pub(crate) fn me(&self) -> Weak<Orchestrator> {
        self.me.clone()
    }
}
