//! The self-rescheduling job loop.
//!
//! Each cycle runs the body once, then waits `interval` measured from the
//! end of that run. Errors and panics from the body are logged and
//! swallowed so a failing cycle never ends the loop. The token is checked
//! before every run, right after it, and during the wait.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures::FutureExt;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, info};

use crate::descriptor::{JobBody, JobDescriptor};
use crate::error::JobError;
use crate::token::CancellationToken;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn log_outcome(name: &str, cycle: u64, result: Result<(), JobError>) {
    match result {
        Ok(()) => debug!(job = %name, cycle, "Job cycle completed"),
        Err(JobError::Cancelled) => info!(job = %name, cycle, "Job cycle exited on cancellation"),
        Err(e) => error!(job = %name, cycle, error = %e, "Job cycle failed"),
    }
}

/// Run the loop on the current thread until `token` is cancelled.
///
/// Async bodies are driven by a private current-thread runtime, so this
/// must not be called from inside an async context. Returns the number of
/// cycles executed.
pub fn run_blocking(descriptor: &JobDescriptor, token: &CancellationToken) -> u64 {
    let name = descriptor.name();
    let mut runtime: Option<Runtime> = None;
    let mut cycle: u64 = 0;

    info!(job = %name, interval = ?descriptor.interval(), "Job loop started");

    loop {
        if token.is_cancelled() {
            break;
        }

        cycle += 1;
        debug!(job = %name, cycle, "Job cycle starting");
        let result = match descriptor.body() {
            JobBody::Blocking(body) => catch_unwind(AssertUnwindSafe(|| body(token)))
                .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload)))),
            JobBody::Async(body) => {
                if runtime.is_none() {
                    match Builder::new_current_thread().enable_all().build() {
                        Ok(rt) => runtime = Some(rt),
                        Err(e) => {
                            error!(job = %name, error = %e, "Failed to build runtime for async job body");
                            break;
                        }
                    }
                }
                match runtime.as_ref() {
                    Some(rt) => rt
                        .block_on(AssertUnwindSafe(body(token.clone())).catch_unwind())
                        .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload)))),
                    None => break,
                }
            }
        };
        log_outcome(name, cycle, result);

        if token.is_cancelled() {
            break;
        }

        if token.interruptible_wait(descriptor.interval()) {
            break;
        }
    }

    info!(job = %name, cycles = cycle, "Job loop stopped");
    cycle
}

/// Run the loop as a future until `token` is cancelled.
///
/// Blocking bodies are moved onto the runtime's blocking pool for each
/// cycle. Returns the number of cycles executed.
pub async fn run_async(descriptor: JobDescriptor, token: CancellationToken) -> u64 {
    let name = descriptor.name().to_string();
    let mut cycle: u64 = 0;

    info!(job = %name, interval = ?descriptor.interval(), "Job loop started");

    loop {
        if token.is_cancelled() {
            break;
        }

        cycle += 1;
        debug!(job = %name, cycle, "Job cycle starting");
        let result = match descriptor.body() {
            JobBody::Async(body) => AssertUnwindSafe(body(token.clone()))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload)))),
            JobBody::Blocking(body) => {
                let body = body.clone();
                let cycle_token = token.clone();
                match tokio::task::spawn_blocking(move || body(&cycle_token)).await {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => Err(JobError::Panicked(panic_message(e.into_panic()))),
                    Err(e) => Err(JobError::failed(e.to_string())),
                }
            }
        };
        log_outcome(&name, cycle, result);

        if token.is_cancelled() {
            break;
        }

        if token.wait(descriptor.interval()).await {
            break;
        }
    }

    info!(job = %name, cycles = cycle, "Job loop stopped");
    cycle
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
