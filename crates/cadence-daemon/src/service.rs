//! Long-running service loop around a supervisor.

use std::sync::Arc;

use cadence_core::Supervisor;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::signal::{DaemonSignal, SignalHandler};

/// Resumes enabled jobs, reacts to reload requests and drains on shutdown.
pub struct ServiceLoop {
    supervisor: Arc<Supervisor>,
    signals: SignalHandler,
    reconcile_on_start: bool,
}

impl ServiceLoop {
    pub fn new(supervisor: Arc<Supervisor>, signals: SignalHandler) -> Self {
        Self {
            supervisor,
            signals,
            reconcile_on_start: true,
        }
    }

    pub fn with_reconcile_on_start(mut self, enabled: bool) -> Self {
        self.reconcile_on_start = enabled;
        self
    }

    /// Run until shutdown is requested, then stop every running job.
    ///
    /// Returns the names of the jobs that were stopped.
    pub async fn run(&self) -> Vec<String> {
        let mut rx = self.signals.subscribe();

        if self.reconcile_on_start {
            self.supervisor.reconcile().await;
        } else {
            info!("Startup reconcile disabled");
        }

        while !self.signals.is_shutdown_requested() {
            match rx.recv().await {
                Ok(DaemonSignal::Shutdown) | Err(RecvError::Closed) => break,
                Ok(DaemonSignal::Reload) => {
                    info!("Reload requested, reconciling jobs");
                    self.supervisor.reconcile().await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Signal receiver lagged by {} message(s)", skipped);
                }
            }
        }

        info!("Shutdown requested, stopping jobs");
        self.supervisor.stop_all().await
    }
}
