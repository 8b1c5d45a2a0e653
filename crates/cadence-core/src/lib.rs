//! # Cadence Core
//!
//! Lifecycle management for recurring background jobs.
//!
//! ## Components
//!
//! - [`JobRegistry`] - Static table of job descriptors
//! - [`SettingsStore`] - Durable enabled/disabled intent per job
//! - [`Supervisor`] - Serialized start/stop per job name and live status
//!
//! [`Supervisor::reconcile`] resumes every job whose persisted state is
//! enabled; [`Supervisor::stop_all`] drains running jobs at shutdown.

mod error;
mod reconciler;
mod registry;
mod settings;
mod supervisor;

pub use error::{SettingsError, SupervisorError};
pub use reconciler::ReconcileReport;
pub use registry::JobRegistry;
pub use settings::{Settings, SettingsStore};
pub use supervisor::{JobStatus, StartOutcome, StopOutcome, Supervisor, DEFAULT_GRACE_PERIOD};
