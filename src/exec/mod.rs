// src/exec/mod.rs

pub mod backend;
pub mod pool;

pub use backend::{ExecutorBackend, Job};
pub use pool::WorkerPool;
