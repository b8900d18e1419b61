// src/orchestrator/recovery.rs

use tracing::{info, warn};

use super::Orchestrator;
use crate::element::{ElementId, Status};
use crate::errors::Result;

/// What [`Orchestrator::recover`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub loaded: usize,
    /// Rows the store could not decode plus records whose type name the
    /// provider does not know. Each one is also sent to the error handler.
    pub skipped: usize,
    /// `Running` elements sent back to `Ready`.
    pub recalled: Vec<ElementId>,
    /// `Running` elements that cannot be recalled and stay unscheduled.
    pub stuck: Vec<ElementId>,
}

impl Orchestrator {
    /// Rebuild memory state from the store.
    ///
    /// Replaces the wheel and the element map with what the store holds,
    /// re-creates logic through the provider, then recalls every element
    /// that was `Running` when the previous process stopped. A bad record
    /// is reported and skipped; the rest are still recovered.
    pub async fn recover(&self) -> Result<RecoveryReport> {
        let buckets = self.store.load_status_markers().await?;
        let loaded = self.store.load_all().await?;

        let mut report = RecoveryReport::default();
        for failure in &loaded.failures {
            report.skipped += 1;
            self.handler.handle(failure);
        }

        let mut elements = Vec::with_capacity(loaded.records.len());
        for record in loaded.records {
            match self.provider.restore(record) {
                Ok(element) => elements.push(element),
                Err(e) => {
                    report.skipped += 1;
                    self.handler.handle(&e);
                }
            }
        }
        report.loaded = elements.len();

        self.wheel.replace(buckets);
        self.elements.replace(elements);

        for id in self.elements_in(Status::Running) {
            match self.recall(id).await {
                Ok(true) => report.recalled.push(id),
                Ok(false) => {
                    warn!(element = %id, "running element cannot be recalled; it stays unscheduled");
                    report.stuck.push(id);
                }
                Err(e) => {
                    self.handler.handle(&e);
                    report.stuck.push(id);
                }
            }
        }

        info!(
            loaded = report.loaded,
            skipped = report.skipped,
            recalled = report.recalled.len(),
            stuck = report.stuck.len(),
            "recovered state from store"
        );
        Ok(report)
    }
}
