//! Daemon-related errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// The worker process was asked to run a job it does not know.
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
