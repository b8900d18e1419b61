// tests/worker_pool.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dagwheel::exec::{ExecutorBackend, Job, WorkerPool};

/// Wait until every submitted job has finished.
async fn settle(pool: &WorkerPool) {
    with_timeout(async {
        while pool.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
}

async fn explode() {
    panic!("job exploded");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn at_most_max_workers_jobs_run_at_once() {
    init_tracing();
    let pool = WorkerPool::new(2);
    assert_eq!(pool.max_workers(), 2);
    assert_eq!(pool.available(), 2);

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    for _ in 0..6 {
        let (running, peak, finished) = (running.clone(), peak.clone(), finished.clone());
        let job: Job = Box::pin(async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            finished.fetch_add(1, Ordering::SeqCst);
        });
        pool.submit(job).await;
    }

    settle(&pool).await;
    assert_eq!(finished.load(Ordering::SeqCst), 6);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(pool.available(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_job_releases_its_slot() {
    init_tracing();
    let pool = WorkerPool::new(1);

    let job: Job = Box::pin(explode());
    pool.submit(job).await;
    settle(&pool).await;
    assert_eq!(pool.in_flight(), 0);
    assert_eq!(pool.available(), 1);

    let ran = Arc::new(AtomicUsize::new(0));
    let counter = ran.clone();
    let job: Job = Box::pin(async move {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    pool.submit(job).await;
    settle(&pool).await;
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_workers_is_clamped_to_one() {
    let pool = WorkerPool::new(0);
    assert_eq!(pool.max_workers(), 1);
    assert_eq!(pool.available(), 1);
    assert_eq!(pool.in_flight(), 0);
}
