// src/orchestrator/protocol.rs

//! Neighbour events of the two-phase completion protocol.
//!
//! Forward phase: a finished producer marks itself delivered in each
//! consumer's `in_edges`. Backward phase: a consumer that has passed its
//! own output on acknowledges each producer in the producer's `out_edges`.
//! Whoever flips the last flag re-enqueues the waiting neighbour.

use tracing::debug;

use super::Orchestrator;
use crate::element::{Element, ElementId, Status};
use crate::errors::Result;

impl Orchestrator {
    /// `NotifyFinish → NotifiedOutput`, delivering to every consumer first.
    pub(crate) async fn notify_outputs(&self, element: &Element) -> Result<()> {
        let producer = element.id();
        for consumer in element.out_edges().keys() {
            self.deliver(producer, *consumer).await;
        }
        self.transition(producer, Status::NotifyFinish, Status::NotifiedOutput, |_| {})
            .await?;
        Ok(())
    }

    /// `NotifiedOutput → NotifiedInput`, acknowledging every producer first.
    ///
    /// `NotifiedInput` is not enqueued on entry; the element queues itself
    /// only if its own consumers have all acknowledged already.
    pub(crate) async fn notify_inputs(&self, element: &Element) -> Result<()> {
        let consumer = element.id();
        for producer in element.in_edges().keys() {
            self.acknowledge(consumer, *producer).await;
        }
        let moved = self
            .transition(consumer, Status::NotifiedOutput, Status::NotifiedInput, |_| {})
            .await?;
        if moved.all_outputs_acknowledged() {
            self.enqueue(&moved, Status::NotifiedInput).await;
        }
        Ok(())
    }

    async fn deliver(&self, producer: ElementId, consumer: ElementId) {
        let updated = self.elements.update(consumer, |element| {
            element.record_mut().in_edges.insert(producer, true);
            element.record_mut().touch();
            element.clone()
        });
        let Some(updated) = updated else {
            debug!(%producer, %consumer, "consumer no longer live; skipping delivery");
            return;
        };

        self.save(&updated).await;
        if updated.status() == Status::Pending && updated.all_inputs_delivered() {
            self.enqueue(&updated, Status::Pending).await;
        }
    }

    async fn acknowledge(&self, consumer: ElementId, producer: ElementId) {
        let updated = self.elements.update(producer, |element| {
            element.record_mut().out_edges.insert(consumer, true);
            element.record_mut().touch();
            element.clone()
        });
        let Some(updated) = updated else {
            debug!(%producer, %consumer, "producer no longer live; skipping acknowledgement");
            return;
        };

        self.save(&updated).await;
        if updated.status() == Status::NotifiedInput && updated.all_outputs_acknowledged() {
            self.enqueue(&updated, Status::NotifiedInput).await;
        }
    }
}
