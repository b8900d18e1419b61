// src/orchestrator/handler.rs

use tracing::error;

use crate::errors::DagwheelError;

/// Sink for failures that must not stop the scheduler: store errors,
/// business-logic errors and invalid transitions found while ticking.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &DagwheelError);
}

/// Default handler: log and carry on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn handle(&self, error: &DagwheelError) {
        error!(error = %error, "element step failed");
    }
}
