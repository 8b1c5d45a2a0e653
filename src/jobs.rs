//! Shell-command job bodies.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use cadence_runloop::{CancellationToken, JobError};
use tracing::debug;

/// How often a blocking body checks its child and its token.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A shell command run once per cycle.
#[derive(Debug, Clone)]
pub(crate) struct ShellCommand {
    job: String,
    command: String,
    working_dir: Option<PathBuf>,
}

impl ShellCommand {
    pub(crate) fn new(job: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            command: command.into(),
            working_dir: None,
        }
    }

    pub(crate) fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    fn std_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new("sh");
        cmd.arg("-c").arg(&self.command).stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn tokio_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run one cycle on the calling thread.
    ///
    /// The child is killed as soon as `token` is cancelled.
    pub(crate) fn run_blocking(&self, token: &CancellationToken) -> Result<(), JobError> {
        let mut child = self.std_command().spawn()?;
        debug!(job = %self.job, pid = child.id(), "Spawned command");

        loop {
            if let Some(status) = child.try_wait()? {
                return self.check_status(status);
            }
            if token.interruptible_wait(POLL_INTERVAL) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(JobError::Cancelled);
            }
        }
    }

    /// Run one cycle as a future, racing the child against `token`.
    pub(crate) async fn run_async(&self, token: CancellationToken) -> Result<(), JobError> {
        let mut child = self.tokio_command().spawn()?;
        debug!(job = %self.job, pid = ?child.id(), "Spawned command");

        let exited = tokio::select! {
            status = child.wait() => Some(status?),
            _ = token.cancelled() => None,
        };
        match exited {
            Some(status) => self.check_status(status),
            None => {
                let _ = child.kill().await;
                Err(JobError::Cancelled)
            }
        }
    }

    fn check_status(&self, status: ExitStatus) -> Result<(), JobError> {
        if status.success() {
            Ok(())
        } else {
            Err(JobError::failed(format!(
                "command `{}` exited with {}",
                self.command, status
            )))
        }
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
