//! Startup resume and shutdown drain.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::supervisor::{StartOutcome, StopOutcome, Supervisor};

/// What a [`Supervisor::reconcile`] pass did, by job name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub started: Vec<String>,
    pub already_running: Vec<String>,
    pub precondition_failed: Vec<String>,
    pub failed: Vec<String>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.precondition_failed.is_empty() && self.failed.is_empty()
    }
}

impl Supervisor {
    /// Start every registered job whose persisted state is enabled.
    ///
    /// Safe to call repeatedly: running jobs report `AlreadyRunning`. A job
    /// that cannot start is logged and skipped; the remaining jobs are still
    /// reconciled.
    pub async fn reconcile(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for (name, enabled) in self.settings().snapshot() {
            if !enabled {
                continue;
            }
            if !self.registry().contains(&name) {
                debug!("Skipping enabled setting for unregistered job {}", name);
                continue;
            }

            match self.start(&name).await {
                Ok(StartOutcome::Started) => report.started.push(name),
                Ok(StartOutcome::AlreadyRunning) => report.already_running.push(name),
                Ok(StartOutcome::PreconditionFailed) => {
                    warn!("Job {} is enabled but its precondition is not met, will retry later", name);
                    report.precondition_failed.push(name);
                }
                Err(e) => {
                    error!("Failed to resume job {}: {}", name, e);
                    report.failed.push(name);
                }
            }
        }

        info!(
            "Reconciled jobs: {} started, {} already running, {} waiting on preconditions, {} failed",
            report.started.len(),
            report.already_running.len(),
            report.precondition_failed.len(),
            report.failed.len()
        );
        report
    }

    /// Stop every running job concurrently, keeping persisted intent so the
    /// next process resumes them. Total time is bounded by one grace period.
    pub async fn stop_all(&self) -> Vec<String> {
        let names = self.registry().names();
        let results = join_all(names.iter().map(|name| self.shutdown_job(name))).await;

        let stopped: Vec<String> = names
            .into_iter()
            .zip(results)
            .filter_map(|(name, result)| match result {
                Ok(StopOutcome::Stopped) => Some(name),
                _ => None,
            })
            .collect();

        info!("Stopped {} running job(s)", stopped.len());
        stopped
    }
}
