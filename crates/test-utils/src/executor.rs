use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dagwheel::exec::{ExecutorBackend, Job};

/// Runs every job to completion before `submit` returns.
///
/// With this backend an element dispatched in one tick has already recorded
/// its result when the tick ends, so tests can count ticks exactly.
#[derive(Debug, Clone, Default)]
pub struct InlineExecutor {
    executed: Arc<AtomicUsize>,
}

impl InlineExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs run so far.
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

impl ExecutorBackend for InlineExecutor {
    fn submit(&self, job: Job) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let executed = Arc::clone(&self.executed);
        Box::pin(async move {
            job.await;
            executed.fetch_add(1, Ordering::SeqCst);
        })
    }
}
