//! Application state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cadence_core::Supervisor;
use parking_lot::RwLock;
use tokio::sync::Notify;

/// Application state shared across handlers.
pub struct AppState {
    pub supervisor: Arc<Supervisor>,
    start_time: Instant,
    ready: AtomicBool,
    serving: AtomicBool,
    startup_error: RwLock<Option<String>>,
    shutdown_requested: AtomicBool,
    /// Notifier for API-triggered shutdown.
    pub shutdown_notify: Arc<Notify>,
}

impl AppState {
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        Self {
            supervisor,
            start_time: Instant::now(),
            ready: AtomicBool::new(false),
            serving: AtomicBool::new(false),
            startup_error: RwLock::new(None),
            shutdown_requested: AtomicBool::new(false),
            shutdown_notify: Arc::new(Notify::new()),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Mark startup (settings load and reconcile) as finished.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Mark the HTTP listener as bound.
    pub fn mark_serving(&self) {
        self.serving.store(true, Ordering::SeqCst);
    }

    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::SeqCst)
    }

    pub fn set_startup_error(&self, error: Option<String>) {
        *self.startup_error.write() = error;
    }

    pub fn startup_error(&self) -> Option<String> {
        self.startup_error.read().clone()
    }

    /// Request shutdown and wake whoever waits on `shutdown_notify`.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}
