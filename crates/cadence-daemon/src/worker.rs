//! Entry point of a process-kind job's child process.
//!
//! The child hosts a single job loop. SIGTERM or SIGINT from the parent
//! cancels the loop's token; the current cycle is allowed to finish if it
//! cooperates, otherwise the parent kills the process after its grace period.

use cadence_core::JobRegistry;
use cadence_runloop::{run_async, CancellationToken};
use tracing::info;

use crate::error::DaemonError;
use crate::signal::SignalHandler;

/// Run `name` from `registry` until `signals` requests shutdown.
///
/// Returns the number of cycles executed.
pub async fn run_worker(
    registry: &JobRegistry,
    name: &str,
    signals: &SignalHandler,
) -> Result<u64, DaemonError> {
    let descriptor = registry
        .get(name)
        .ok_or_else(|| DaemonError::UnknownJob(name.to_string()))?;

    let token = CancellationToken::new();
    let canceller = token.clone();
    let watcher = signals.clone();
    tokio::spawn(async move {
        watcher.wait_for_shutdown().await;
        canceller.cancel();
    });

    info!("Worker process {} hosting job {}", std::process::id(), name);
    let cycles = run_async(descriptor.as_ref().clone(), token).await;
    info!("Worker for job {} exiting after {} cycle(s)", name, cycles);
    Ok(cycles)
}
