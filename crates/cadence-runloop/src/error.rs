//! Job execution errors.

use thiserror::Error;

/// Errors raised by a job body or while spawning its execution unit.
#[derive(Debug, Error)]
pub enum JobError {
    /// The body observed its token and exited early.
    #[error("Job cancelled")]
    Cancelled,

    /// The body reported a failure for this cycle.
    #[error("Job failed: {0}")]
    Failed(String),

    /// The body panicked.
    #[error("Job panicked: {0}")]
    Panicked(String),

    /// The execution unit could not be created.
    #[error("Failed to spawn execution unit: {0}")]
    Spawn(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    pub fn failed(message: impl Into<String>) -> Self {
        JobError::Failed(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobError::Cancelled)
    }
}
