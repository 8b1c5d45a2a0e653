//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl Config {
    /// Look up a configured job by name.
    pub fn job(&self, name: &str) -> Option<&JobConfig> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Supervisor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// File holding the persisted job name to enabled map.
    #[serde(default = "default_settings_path")]
    pub settings_path: String,

    /// How long `stop` waits for an execution unit before giving up on it.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Resume enabled jobs when the server starts.
    #[serde(default = "default_true")]
    pub reconcile_on_start: bool,
}

impl SupervisorConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(&self.settings_path)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            grace_period_ms: default_grace_period_ms(),
            reconcile_on_start: true,
        }
    }
}

fn default_settings_path() -> String {
    "worker_settings.json".to_string()
}

fn default_grace_period_ms() -> u64 {
    5000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files. Stdout only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Execution unit a job's loop runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Dedicated OS thread.
    #[default]
    Thread,
    /// Child OS process.
    Process,
    /// Task on the async runtime.
    Task,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Thread => write!(f, "thread"),
            JobKind::Process => write!(f, "process"),
            JobKind::Task => write!(f, "task"),
        }
    }
}

/// A configured background job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,

    /// Pause between the end of one cycle and the start of the next.
    pub interval_secs: u64,

    #[serde(default)]
    pub kind: JobKind,

    /// Shell command run once per cycle.
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// Paths that must exist before the job may start.
    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub default_enabled: bool,
}

impl JobConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
