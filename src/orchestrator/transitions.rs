// src/orchestrator/transitions.rs

//! Per-status steps taken when an element's wheel entry fires.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::Orchestrator;
use crate::element::{Element, ElementContext, ElementId, ElementRecord, Outcome, Status};
use crate::errors::{DagwheelError, Result};
use crate::exec::Job;

impl Orchestrator {
    /// Take the step appropriate to the element's current status.
    ///
    /// Returns `true` when the element was destroyed.
    pub async fn advance(&self, id: ElementId) -> Result<bool> {
        let element = self
            .elements
            .get(id)
            .ok_or(DagwheelError::ElementNotFound(id))?;

        match element.status() {
            Status::New => {
                warn!(element = %id, "uncommitted element reached the wheel; ignoring");
            }
            Status::Pending => self.promote_ready(&element).await?,
            Status::Ready => self.dispatch(&element).await?,
            Status::Running => {
                debug!(element = %id, "element is still running");
            }
            Status::NotifyFinish => self.notify_outputs(&element).await?,
            Status::NotifiedOutput => self.notify_inputs(&element).await?,
            Status::NotifiedInput => self.promote_destroyable(&element).await?,
            Status::Destroyable | Status::Destroyed => {
                self.destroy(&element).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Move `id` from `from` to `to`, keeping wheel, memory and store in
    /// step. `mutate` runs on the record under the table lock.
    ///
    /// Order: enter the new wheel entry, persist the record and status
    /// marker, then leave the old wheel entry.
    pub(crate) async fn transition<F>(
        &self,
        id: ElementId,
        from: Status,
        to: Status,
        mutate: F,
    ) -> Result<Element>
    where
        F: FnOnce(&mut ElementRecord) + Send,
    {
        let moved = self
            .elements
            .update(id, |element| {
                if element.status() != from {
                    return Err(DagwheelError::InvalidTransition {
                        id,
                        from: element.status(),
                        to,
                    });
                }
                let record = element.record_mut();
                mutate(record);
                record.status = to;
                record.touch();
                Ok(element.clone())
            })
            .ok_or(DagwheelError::ElementNotFound(id))??;

        if to.is_enqueued_on_entry() {
            self.enqueue(&moved, to).await;
        }
        self.save(&moved).await;
        if moved.is_persistent() {
            self.report(
                self.store
                    .swap_status_marker(moved.workflow_id(), id, Some(from), to)
                    .await,
            );
        }
        self.dequeue(&moved, from).await;

        debug!(element = %id, kind = moved.type_name(), %from, %to, "status changed");
        Ok(moved)
    }

    pub(crate) async fn enqueue(&self, element: &Element, status: Status) {
        let cycle = self.cycle_for(element, status);
        self.wheel.insert(cycle, element.id(), status);
        if element.is_persistent() {
            self.report(self.store.add_wheel_entry(cycle, element.id(), status).await);
        }
    }

    pub(crate) async fn dequeue(&self, element: &Element, status: Status) {
        let cycle = self.cycle_for(element, status);
        self.wheel.remove(cycle, element.id(), status);
        if element.is_persistent() {
            self.report(
                self.store
                    .remove_wheel_entry(cycle, element.id(), status)
                    .await,
            );
        }
    }

    pub(crate) async fn save(&self, element: &Element) {
        if element.is_persistent() {
            self.report(self.store.put(element.record()).await);
        }
    }

    /// `Pending → Ready` once every input is delivered. An element that is
    /// still waiting leaves the wheel until a producer re-enqueues it.
    async fn promote_ready(&self, element: &Element) -> Result<()> {
        if element.all_inputs_delivered() {
            self.transition(element.id(), Status::Pending, Status::Ready, |_| {})
                .await?;
        } else {
            debug!(element = %element.id(), "inputs outstanding; parking");
            self.dequeue(element, Status::Pending).await;
        }
        Ok(())
    }

    /// `Ready → Running`, then hand the execution to the executor.
    async fn dispatch(&self, element: &Element) -> Result<()> {
        let id = element.id();
        let running = self
            .transition(id, Status::Ready, Status::Running, |_| {})
            .await?;

        let inputs: BTreeMap<String, serde_json::Value> = running
            .attributes()
            .iter()
            .map(|(attribute, producer)| {
                let value = self.value_of(*producer).unwrap_or(serde_json::Value::Null);
                (attribute.clone(), value)
            })
            .collect();
        let ctx = ElementContext::new(
            id,
            running.workflow_id(),
            inputs,
            running.variables().clone(),
            self.me(),
        );

        let logic = running.logic().clone();
        let me = self.me();
        let job: Job = Box::pin(async move {
            let outcome = logic.execute(ctx).await;
            let Some(orchestrator) = me.upgrade() else {
                return;
            };
            orchestrator.complete(id, outcome).await;
        });

        self.executor.submit(job).await;
        Ok(())
    }

    /// Apply what an execution returned.
    async fn complete(&self, id: ElementId, outcome: anyhow::Result<Outcome>) {
        let result = match outcome {
            Ok(Outcome::Finish {
                value,
                variables,
                expansion,
            }) => self.record_result(id, value, variables, expansion).await,
            Ok(Outcome::Recall { variables }) => match self.recall_with(id, variables).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(DagwheelError::InvalidTransition {
                    id,
                    from: Status::Running,
                    to: Status::Ready,
                }),
                Err(e) => Err(e),
            },
            Err(e) => Err(DagwheelError::BusinessLogic {
                id,
                message: format!("{e:#}"),
            }),
        };
        self.report(result);
    }

    /// `NotifiedInput → Destroyable` once every consumer has acknowledged.
    async fn promote_destroyable(&self, element: &Element) -> Result<()> {
        if element.all_outputs_acknowledged() {
            self.transition(
                element.id(),
                Status::NotifiedInput,
                Status::Destroyable,
                |_| {},
            )
            .await?;
        } else {
            debug!(element = %element.id(), "consumers outstanding; parking");
            self.dequeue(element, Status::NotifiedInput).await;
        }
        Ok(())
    }

    /// Remove a `Destroyable` element from memory, wheel and store.
    async fn destroy(&self, element: &Element) -> Result<()> {
        let id = element.id();
        let from = element.status();
        if !matches!(from, Status::Destroyable | Status::Destroyed) {
            return Err(DagwheelError::InvalidTransition {
                id,
                from,
                to: Status::Destroyed,
            });
        }

        if element.is_persistent() {
            self.report(
                self.store
                    .remove_status_marker(element.workflow_id(), id)
                    .await,
            );
            self.report(self.store.delete(id).await);
        }
        self.elements.remove(id);
        self.dequeue(element, from).await;

        debug!(element = %id, kind = element.type_name(), "element destroyed");
        Ok(())
    }
}
