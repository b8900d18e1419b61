// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The orchestrator hands every element execution to an `ExecutorBackend`
//! as a boxed job. [`WorkerPool`](super::WorkerPool) runs jobs concurrently
//! on tokio tasks. Tests can run them inline to make ticks deterministic.

use std::future::Future;
use std::pin::Pin;

/// A unit of work: execute one element and record its outcome.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub trait ExecutorBackend: Send + Sync {
    /// Accept a job.
    ///
    /// The returned future resolves once the job has been handed off. An
    /// implementation may also drive the job to completion before resolving.
    fn submit(&self, job: Job) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Jobs accepted but not yet finished.
    fn in_flight(&self) -> usize {
        0
    }
}
