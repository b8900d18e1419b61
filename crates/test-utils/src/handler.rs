use std::sync::{Arc, Mutex};

use dagwheel::errors::DagwheelError;
use dagwheel::orchestrator::ErrorHandler;

/// Keeps the message of every reported error.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    errors: Arc<Mutex<Vec<String>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.errors().iter().any(|e| e.contains(needle))
    }
}

impl ErrorHandler for RecordingHandler {
    fn handle(&self, error: &DagwheelError) {
        tracing::debug!(error = %error, "recorded error");
        self.errors.lock().unwrap().push(error.to_string());
    }
}
