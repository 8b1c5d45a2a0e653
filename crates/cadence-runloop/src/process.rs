//! Child-process execution.
//!
//! A process-kind job runs its loop in a separate OS process started by a
//! [`ProcessLauncher`]. The child is expected to exit on SIGTERM; if it is
//! still alive after the grace period it is killed.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::descriptor::ExecutionKind;
use crate::error::JobError;
use crate::handle::{wait_for_exit, ExecutionHandle};

/// Placeholder replaced by the job name in launcher arguments.
pub const JOB_PLACEHOLDER: &str = "{job}";

/// How long to wait for the child to be reaped after SIGKILL.
const KILL_WAIT: Duration = Duration::from_secs(1);

/// Builds the command that hosts a job in a child process.
pub trait ProcessLauncher: Send + Sync {
    fn command(&self, job: &str) -> Command;
}

/// Launcher running a fixed program with templated arguments.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Re-execute the current binary as `<exe> worker <job>`.
    pub fn current_exe() -> Result<Self, JobError> {
        let exe = std::env::current_exe()?;
        Ok(Self::new(exe.display().to_string()).with_args(["worker", JOB_PLACEHOLDER]))
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with the job placeholder substituted.
    pub fn args_for(&self, job: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(JOB_PLACEHOLDER, job))
            .collect()
    }
}

impl ProcessLauncher for CommandLauncher {
    fn command(&self, job: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args_for(job));
        command
    }
}

/// Job loop hosted in a child process.
pub struct ProcessHandle {
    name: String,
    pid: u32,
    child: Mutex<Child>,
}

impl ProcessHandle {
    pub fn spawn(job: &str, launcher: &dyn ProcessLauncher) -> Result<Self, JobError> {
        let child = launcher
            .command(job)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| JobError::Spawn(format!("failed to start process for '{}': {}", job, e)))?;
        let pid = child.id();
        info!(job = %job, pid, "Job process started");
        Ok(Self {
            name: job.to_string(),
            pid,
            child: Mutex::new(child),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    fn kill(&self) {
        let mut child = self.child.lock();
        if let Err(e) = child.kill() {
            debug!(job = %self.name, pid = self.pid, error = %e, "Kill failed");
        }
    }

    #[cfg(unix)]
    fn terminate(&self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        match kill(Pid::from_raw(self.pid as i32), Signal::SIGTERM) {
            Ok(()) => debug!(job = %self.name, pid = self.pid, "Sent SIGTERM"),
            Err(nix::errno::Errno::ESRCH) => {}
            Err(e) => warn!(job = %self.name, pid = self.pid, error = %e, "Failed to send SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self) {
        self.kill();
    }
}

#[async_trait]
impl ExecutionHandle for ProcessHandle {
    fn kind(&self) -> ExecutionKind {
        ExecutionKind::Process
    }

    fn is_alive(&self) -> bool {
        match self.child.lock().try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => true,
            Err(e) => {
                warn!(job = %self.name, pid = self.pid, error = %e, "Could not poll job process");
                false
            }
        }
    }

    fn force_stop(&self) {
        if self.is_alive() {
            self.terminate();
        }
    }

    async fn join(&self, timeout: Duration) -> bool {
        if wait_for_exit(|| self.is_alive(), timeout).await {
            return true;
        }

        warn!(
            job = %self.name,
            pid = self.pid,
            "Job process ignored SIGTERM for {:?}, killing",
            timeout
        );
        self.kill();
        wait_for_exit(|| self.is_alive(), KILL_WAIT).await
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        let child = self.child.get_mut();
        if let Ok(None) = child.try_wait() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
