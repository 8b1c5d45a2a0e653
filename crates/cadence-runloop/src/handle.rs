//! Execution handles.
//!
//! The supervisor controls every execution unit through [`ExecutionHandle`]
//! and never touches the thread, task or child directly.

use std::thread::JoinHandle as ThreadJoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle as TaskJoinHandle;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::descriptor::{ExecutionKind, JobDescriptor};
use crate::error::JobError;
use crate::process::{ProcessHandle, ProcessLauncher};
use crate::schedule::{run_async, run_blocking};
use crate::token::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Supervisor-side view of one running job loop.
#[async_trait]
pub trait ExecutionHandle: Send + Sync {
    fn kind(&self) -> ExecutionKind;

    fn is_alive(&self) -> bool;

    /// Best-effort termination beyond token cancellation. Only process
    /// handles can actually force anything.
    fn force_stop(&self);

    /// Wait up to `timeout` for the unit to finish. Returns `true` if it is
    /// no longer alive.
    async fn join(&self, timeout: Duration) -> bool;
}

/// Poll `is_alive` until it turns false or `timeout` elapses.
pub(crate) async fn wait_for_exit(is_alive: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while is_alive() {
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    true
}

/// Job loop hosted on a dedicated OS thread.
pub struct ThreadHandle {
    name: String,
    thread: Mutex<Option<ThreadJoinHandle<u64>>>,
}

impl ThreadHandle {
    pub fn spawn(descriptor: JobDescriptor, token: CancellationToken) -> Result<Self, JobError> {
        let name = descriptor.name().to_string();
        let thread = std::thread::Builder::new()
            .name(format!("job-{}", name))
            .spawn(move || run_blocking(&descriptor, &token))?;
        Ok(Self {
            name,
            thread: Mutex::new(Some(thread)),
        })
    }

    fn reap(&self) {
        let mut slot = self.thread.lock();
        if slot.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(thread) = slot.take() {
                match thread.join() {
                    Ok(cycles) => debug!(job = %self.name, cycles, "Job thread exited"),
                    Err(_) => error!(job = %self.name, "Job thread panicked outside a cycle"),
                }
            }
        }
    }
}

#[async_trait]
impl ExecutionHandle for ThreadHandle {
    fn kind(&self) -> ExecutionKind {
        ExecutionKind::Thread
    }

    fn is_alive(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    fn force_stop(&self) {
        debug!(job = %self.name, "Threads cannot be forced, relying on cancellation");
    }

    async fn join(&self, timeout: Duration) -> bool {
        let exited = wait_for_exit(|| self.is_alive(), timeout).await;
        if exited {
            self.reap();
        }
        exited
    }
}

/// Job loop hosted on the async runtime.
pub struct TaskHandle {
    name: String,
    task: TaskJoinHandle<u64>,
}

impl TaskHandle {
    pub fn spawn(descriptor: JobDescriptor, token: CancellationToken) -> Result<Self, JobError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| JobError::Spawn(format!("no async runtime available: {}", e)))?;
        let name = descriptor.name().to_string();
        let task = runtime.spawn(run_async(descriptor, token));
        Ok(Self { name, task })
    }
}

#[async_trait]
impl ExecutionHandle for TaskHandle {
    fn kind(&self) -> ExecutionKind {
        ExecutionKind::Task
    }

    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    fn force_stop(&self) {
        debug!(job = %self.name, "Tasks are not aborted, relying on cancellation");
    }

    async fn join(&self, timeout: Duration) -> bool {
        wait_for_exit(|| self.is_alive(), timeout).await
    }
}

/// Spawn the execution unit matching `descriptor.kind()`.
pub fn spawn_execution(
    descriptor: &JobDescriptor,
    token: CancellationToken,
    launcher: Option<&dyn ProcessLauncher>,
) -> Result<Box<dyn ExecutionHandle>, JobError> {
    let handle: Box<dyn ExecutionHandle> = match descriptor.kind() {
        ExecutionKind::Thread => Box::new(ThreadHandle::spawn(descriptor.clone(), token)?),
        ExecutionKind::Task => Box::new(TaskHandle::spawn(descriptor.clone(), token)?),
        ExecutionKind::Process => {
            let launcher = launcher.ok_or_else(|| {
                JobError::Spawn(format!(
                    "job '{}' needs a process launcher",
                    descriptor.name()
                ))
            })?;
            Box::new(ProcessHandle::spawn(descriptor.name(), launcher)?)
        }
    };
    Ok(handle)
}
