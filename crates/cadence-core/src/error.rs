//! Supervisor and settings errors.

use cadence_runloop::JobError;
use thiserror::Error;

/// Errors surfaced to callers of the supervisor.
///
/// `AlreadyRunning`, `NotRunning` and `PreconditionFailed` are outcomes,
/// not errors; see [`StartOutcome`](crate::StartOutcome) and
/// [`StopOutcome`](crate::StopOutcome).
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Failed to start job {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: JobError,
    },

    /// The unit from the last stop outlived its grace period and has not
    /// exited yet.
    #[error("Job {0} is still shutting down")]
    StillStopping(String),
}

/// Settings file failures. Never fatal: the store logs these and falls
/// back to defaults or the in-memory map.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings file must contain a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Failed to replace settings file: {0}")]
    Persist(String),
}
