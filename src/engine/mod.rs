// src/engine/mod.rs

//! Scheduler driver.
//!
//! The orchestrator holds the semantics; [`runtime`] is the async shell that
//! calls [`Orchestrator::tick`](crate::orchestrator::Orchestrator::tick) in a
//! loop, sleeps when nothing was due and reports to caller hooks.

pub mod runtime;

pub use runtime::SchedulerLoop;

/// Runtime options for the driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Stop once the orchestrator holds no elements (used for `--once`).
    pub exit_when_idle: bool,
}

/// Passed to the driver hooks after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// 1-based iteration number of this driver.
    pub iteration: u64,
    /// Whether any wheel entry was due.
    pub busy: bool,
    /// Live element count after the tick.
    pub elements: usize,
}
