// src/exec/pool.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::backend::{ExecutorBackend, Job};

/// Bounded worker pool on top of tokio tasks.
///
/// Every job gets its own task; at most `max_workers` of them run at once,
/// the rest wait for a permit.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    max_workers: usize,
    in_flight: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Counts one job as in flight until dropped, including when the job
/// panics and its task unwinds.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ExecutorBackend for WorkerPool {
    fn submit(&self, job: Job) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let permits = Arc::clone(&self.permits);
        let guard = InFlight::enter(&self.in_flight);

        tokio::spawn(async move {
            let _guard = guard;
            match permits.acquire_owned().await {
                Ok(_permit) => job.await,
                Err(e) => warn!(error = %e, "worker pool closed; dropping job"),
            }
        });
        debug!(in_flight = self.in_flight(), "job submitted to worker pool");

        Box::pin(async {})
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}
