//! # Cadence Daemon
//!
//! Process-level plumbing around the supervisor:
//!
//! - Signal handling (SIGTERM/SIGINT for shutdown, SIGHUP for a fresh reconcile pass)
//! - The service loop that resumes jobs at startup and drains them on shutdown
//! - The entry point of a process-kind job's child process

pub mod error;
pub mod service;
pub mod signal;
pub mod worker;

pub use error::DaemonError;
pub use service::ServiceLoop;
pub use signal::{DaemonSignal, SignalHandler};
pub use worker::run_worker;
