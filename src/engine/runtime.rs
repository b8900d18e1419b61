// src/engine/runtime.rs

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use super::{RuntimeOptions, TickReport};
use crate::orchestrator::Orchestrator;

/// Drives an [`Orchestrator`] from a single task.
///
/// Workers submitted by a tick run concurrently with later ticks.
#[derive(Debug, Clone)]
pub struct SchedulerLoop {
    orchestrator: Arc<Orchestrator>,
    sleep_interval: Duration,
}

impl SchedulerLoop {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let sleep_interval = orchestrator.config().sleep_interval;
        Self {
            orchestrator,
            sleep_interval,
        }
    }

    pub fn with_sleep_interval(mut self, interval: Duration) -> Self {
        self.sleep_interval = interval;
        self
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Tick until a hook breaks.
    ///
    /// `on_idle` runs after every tick where nothing was due, before the
    /// driver sleeps. `on_tick` runs after every tick, busy or idle.
    /// Returns the number of iterations performed.
    pub async fn start<I, T>(&self, mut on_idle: I, mut on_tick: T) -> u64
    where
        I: FnMut(&TickReport) -> ControlFlow<()>,
        T: FnMut(&TickReport) -> ControlFlow<()>,
    {
        info!(sleep_interval = ?self.sleep_interval, "scheduler loop started");
        let mut iteration = 0u64;

        loop {
            iteration += 1;
            let busy = self.orchestrator.tick().await;
            let report = TickReport {
                iteration,
                busy,
                elements: self.orchestrator.element_count(),
            };

            if !busy {
                if on_idle(&report).is_break() {
                    debug!(iteration, "idle hook requested stop");
                    break;
                }
                if !self.sleep_interval.is_zero() {
                    tokio::time::sleep(self.sleep_interval).await;
                }
            }

            if on_tick(&report).is_break() {
                debug!(iteration, "tick hook requested stop");
                break;
            }
        }

        info!(iterations = iteration, "scheduler loop stopped");
        iteration
    }

    /// Run until shutdown is signalled or, with `exit_when_idle`, until the
    /// orchestrator is idle.
    pub async fn run(&self, options: RuntimeOptions, shutdown: watch::Receiver<bool>) -> u64 {
        let orchestrator = Arc::clone(&self.orchestrator);
        let stop_requested = move || *shutdown.borrow();

        self.start(
            |_| {
                if options.exit_when_idle && orchestrator.is_idle() {
                    info!("no elements left; exiting");
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
            |_| {
                if stop_requested() {
                    info!("shutdown requested; stopping");
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        )
        .await
    }

    /// Run until the orchestrator is idle.
    pub async fn run_until_idle(&self) -> u64 {
        let orchestrator = Arc::clone(&self.orchestrator);
        self.start(
            |_| {
                if orchestrator.is_idle() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
            |_| ControlFlow::Continue(()),
        )
        .await
    }
}
