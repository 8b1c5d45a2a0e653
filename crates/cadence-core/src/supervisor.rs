//! Worker supervisor.
//!
//! Owns one [`WorkerState`] per registered job. Every operation on a job
//! name holds that name's async lock for its whole duration, so start and
//! stop of the same job are totally ordered while different jobs proceed
//! in parallel. Raw execution handles never leave this module.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use cadence_runloop::{
    spawn_execution, CancellationToken, ExecutionHandle, JobDescriptor, ProcessLauncher,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::SupervisorError;
use crate::registry::JobRegistry;
use crate::settings::SettingsStore;

/// Default time `stop` waits for an execution unit to finish.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Result of [`Supervisor::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    PreconditionFailed,
}

impl StartOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartOutcome::Started => "started",
            StartOutcome::AlreadyRunning => "already_running",
            StartOutcome::PreconditionFailed => "precondition_failed",
        }
    }
}

/// Result of [`Supervisor::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

impl StopOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopOutcome::Stopped => "stopped",
            StopOutcome::NotRunning => "not_running",
        }
    }
}

/// Point-in-time view of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub enabled: bool,
    pub running: bool,
    /// `None` for names that exist only in the settings file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

struct WorkerState {
    name: String,
    enabled: bool,
    running: bool,
    handle: Option<Box<dyn ExecutionHandle>>,
    token: Option<CancellationToken>,
    started_at: Option<DateTime<Utc>>,
    /// Unit that outlived its grace period on the last stop. Its token is
    /// already cancelled.
    lingering: Option<Box<dyn ExecutionHandle>>,
}

impl WorkerState {
    fn new(name: &str, enabled: bool) -> Self {
        Self {
            name: name.to_string(),
            enabled,
            running: false,
            handle: None,
            token: None,
            started_at: None,
            lingering: None,
        }
    }

    fn is_live(&self) -> bool {
        self.running && self.handle.as_ref().is_some_and(|h| h.is_alive())
    }

    fn clear(&mut self) {
        self.running = false;
        self.handle = None;
        self.token = None;
        self.started_at = None;
    }
}

pub struct Supervisor {
    registry: JobRegistry,
    settings: Arc<SettingsStore>,
    workers: DashMap<String, Arc<Mutex<WorkerState>>>,
    launcher: Option<Arc<dyn ProcessLauncher>>,
    grace_period: Duration,
}

impl Supervisor {
    /// Create a supervisor with one worker slot per job already in `registry`.
    pub fn new(registry: JobRegistry, settings: Arc<SettingsStore>) -> Self {
        let workers = DashMap::new();
        for name in registry.names() {
            if let Some(descriptor) = registry.get(&name) {
                settings.register_default(&name, descriptor.default_enabled());
            }
            let enabled = settings.is_enabled(&name);
            workers.insert(name.clone(), Arc::new(Mutex::new(WorkerState::new(&name, enabled))));
        }

        Self {
            registry,
            settings,
            workers,
            launcher: None,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Launcher used for process-kind jobs.
    pub fn with_launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Register a job after construction. Call before `reconcile`.
    pub fn register_job(&self, descriptor: JobDescriptor) -> Result<(), SupervisorError> {
        let name = descriptor.name().to_string();
        let default_enabled = descriptor.default_enabled();
        self.registry.register(descriptor)?;
        self.settings.register_default(&name, default_enabled);

        let enabled = self.settings.is_enabled(&name);
        self.workers
            .insert(name.clone(), Arc::new(Mutex::new(WorkerState::new(&name, enabled))));
        debug!("Registered job {} (enabled={})", name, enabled);
        Ok(())
    }

    fn worker(&self, name: &str) -> Result<Arc<Mutex<WorkerState>>, SupervisorError> {
        self.workers
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SupervisorError::NotFound(name.to_string()))
    }

    /// Start a job unless it is already running or its precondition fails.
    ///
    /// A successful start persists `enabled=true`. Other outcomes leave the
    /// persisted flag untouched.
    pub async fn start(&self, name: &str) -> Result<StartOutcome, SupervisorError> {
        let descriptor = self.registry.lookup(name)?;
        let worker = self.worker(name)?;
        let mut state = worker.lock().await;
        self.start_locked(&descriptor, &mut state).await
    }

    /// Record that a job is enabled, then start it.
    ///
    /// Unlike [`start`](Self::start), `enabled=true` is persisted before the
    /// precondition is evaluated, so a `PreconditionFailed` job is retried
    /// by the next [`reconcile`](Self::reconcile).
    pub async fn enable(&self, name: &str) -> Result<StartOutcome, SupervisorError> {
        let descriptor = self.registry.lookup(name)?;
        let worker = self.worker(name)?;
        let mut state = worker.lock().await;
        state.enabled = true;
        self.settings.set(name, true);
        self.start_locked(&descriptor, &mut state).await
    }

    async fn start_locked(
        &self,
        descriptor: &JobDescriptor,
        state: &mut WorkerState,
    ) -> Result<StartOutcome, SupervisorError> {
        let name = descriptor.name();

        if state.running {
            if state.is_live() {
                return Ok(StartOutcome::AlreadyRunning);
            }
            warn!("Job {} exited without being stopped, restarting", name);
            state.clear();
        }

        if !descriptor.precondition_holds() {
            info!("Job {} not started: precondition not met", name);
            return Ok(StartOutcome::PreconditionFailed);
        }

        if let Some(previous) = state.lingering.take() {
            if !previous.join(self.grace_period).await {
                warn!("Job {} not started: previous execution unit is still running", name);
                state.lingering = Some(previous);
                return Err(SupervisorError::StillStopping(name.to_string()));
            }
            debug!("Previous execution unit of job {} has exited", name);
        }

        let token = CancellationToken::new();
        let handle = spawn_execution(descriptor, token.clone(), self.launcher.as_deref())
            .map_err(|source| SupervisorError::Spawn {
                name: name.to_string(),
                source,
            })?;

        state.handle = Some(handle);
        state.token = Some(token);
        state.running = true;
        state.enabled = true;
        state.started_at = Some(Utc::now());
        self.settings.set(name, true);

        info!(
            "Started job {} on {} (interval {:?})",
            name,
            descriptor.kind(),
            descriptor.interval()
        );
        Ok(StartOutcome::Started)
    }

    /// Stop a running job and persist `enabled=false`.
    pub async fn stop(&self, name: &str) -> Result<StopOutcome, SupervisorError> {
        self.registry.lookup(name)?;
        let worker = self.worker(name)?;
        let mut state = worker.lock().await;
        Ok(self.halt(&mut state, true).await)
    }

    /// Record that a job is disabled, stopping it if it runs.
    ///
    /// Unlike [`stop`](Self::stop), the disabled flag is persisted even when
    /// the job was not running.
    pub async fn disable(&self, name: &str) -> Result<StopOutcome, SupervisorError> {
        self.registry.lookup(name)?;
        let worker = self.worker(name)?;
        let mut state = worker.lock().await;
        let outcome = self.halt(&mut state, true).await;
        if outcome == StopOutcome::NotRunning {
            state.enabled = false;
            self.settings.set(name, false);
            info!("Job {} disabled", name);
        }
        Ok(outcome)
    }

    /// Stop without touching the persisted flag. Used when draining.
    pub(crate) async fn shutdown_job(&self, name: &str) -> Result<StopOutcome, SupervisorError> {
        let worker = self.worker(name)?;
        let mut state = worker.lock().await;
        Ok(self.halt(&mut state, false).await)
    }

    async fn halt(&self, state: &mut WorkerState, persist: bool) -> StopOutcome {
        if !state.running {
            return StopOutcome::NotRunning;
        }

        if let Some(token) = state.token.take() {
            token.cancel();
        }
        if let Some(handle) = state.handle.take() {
            handle.force_stop();
            if !handle.join(self.grace_period).await {
                warn!(
                    job = %state.name,
                    grace_period = ?self.grace_period,
                    "ForceStopTimeout: execution unit still alive after grace period"
                );
                state.lingering = Some(handle);
            }
        }

        state.clear();
        if persist {
            state.enabled = false;
            self.settings.set(&state.name, false);
        }
        info!("Stopped job {}", state.name);
        StopOutcome::Stopped
    }

    /// Whether the job is currently running.
    pub async fn is_running(&self, name: &str) -> Result<bool, SupervisorError> {
        let worker = self.worker(name)?;
        let state = worker.lock().await;
        Ok(state.is_live())
    }

    /// Status of a single registered job.
    pub async fn job_status(&self, name: &str) -> Result<JobStatus, SupervisorError> {
        let descriptor = self.registry.lookup(name)?;
        let worker = self.worker(name)?;
        let state = worker.lock().await;
        Ok(JobStatus {
            enabled: state.enabled,
            running: state.is_live(),
            kind: Some(descriptor.kind().to_string()),
            interval_secs: Some(descriptor.interval().as_secs()),
            started_at: if state.is_live() { state.started_at } else { None },
        })
    }

    /// Status of every registered job plus names known only from settings.
    pub async fn status(&self) -> BTreeMap<String, JobStatus> {
        let mut statuses = BTreeMap::new();
        for name in self.registry.names() {
            if let Ok(status) = self.job_status(&name).await {
                statuses.insert(name, status);
            }
        }

        for (name, enabled) in self.settings.snapshot() {
            statuses.entry(name).or_insert(JobStatus {
                enabled,
                running: false,
                kind: None,
                interval_secs: None,
                started_at: None,
            });
        }
        statuses
    }

    /// Names of jobs whose execution unit is alive.
    pub async fn running_jobs(&self) -> Vec<String> {
        let mut running = Vec::new();
        for name in self.registry.names() {
            if let Ok(true) = self.is_running(&name).await {
                running.push(name);
            }
        }
        running
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
