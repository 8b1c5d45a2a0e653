//! # Cadence RunLoop
//!
//! The execution side of the supervisor:
//!
//! - [`CancellationToken`]: set-once stop signal with interruptible waits
//! - [`JobDescriptor`]: a named job body with its interval and precondition
//! - [`run_blocking`] / [`run_async`]: the self-rescheduling loop
//! - [`ExecutionHandle`]: uniform control over a thread, task or child process
//!   running that loop

mod descriptor;
mod error;
mod handle;
mod process;
mod schedule;
mod token;

pub use descriptor::{AsyncBody, BlockingBody, ExecutionKind, JobBody, JobDescriptor, Precondition};
pub use error::JobError;
pub use handle::{spawn_execution, ExecutionHandle, TaskHandle, ThreadHandle};
pub use process::{CommandLauncher, ProcessHandle, ProcessLauncher, JOB_PLACEHOLDER};
pub use schedule::{run_async, run_blocking};
pub use token::CancellationToken;
