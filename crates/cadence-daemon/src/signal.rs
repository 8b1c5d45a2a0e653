//! Signal handling for the server and worker processes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::DaemonError;

/// Lifecycle signal delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSignal {
    /// Drain jobs and exit (SIGTERM, SIGINT, HTTP shutdown).
    Shutdown,
    /// Run another reconcile pass (SIGHUP).
    Reload,
}

impl std::fmt::Display for DaemonSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaemonSignal::Shutdown => write!(f, "SHUTDOWN"),
            DaemonSignal::Reload => write!(f, "RELOAD"),
        }
    }
}

/// Fan-out of lifecycle signals. Clones share state.
#[derive(Clone)]
pub struct SignalHandler {
    sender: broadcast::Sender<DaemonSignal>,
    shutdown_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            sender,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DaemonSignal> {
        self.sender.subscribe()
    }

    pub fn send(&self, signal: DaemonSignal) {
        debug!("Sending signal: {}", signal);
        if signal == DaemonSignal::Shutdown {
            self.shutdown_requested.store(true, Ordering::SeqCst);
        }
        let _ = self.sender.send(signal);
    }

    pub fn request_shutdown(&self) {
        self.send(DaemonSignal::Shutdown);
    }

    pub fn request_reload(&self) {
        self.send(DaemonSignal::Reload);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested, including before this call.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.subscribe();
        if self.is_shutdown_requested() {
            return;
        }
        loop {
            match rx.recv().await {
                Ok(DaemonSignal::Shutdown) | Err(broadcast::error::RecvError::Closed) => return,
                Ok(DaemonSignal::Reload) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if self.is_shutdown_requested() {
                        return;
                    }
                }
            }
        }
    }

    /// Forward OS signals into this handler (Unix).
    #[cfg(unix)]
    pub fn install_os_signals(&self) -> Result<(), DaemonError> {
        use tokio::signal::unix::{signal, SignalKind};

        let setup = |kind: SignalKind| signal(kind).map_err(|e| DaemonError::SignalSetup(e.to_string()));
        let mut sigterm = setup(SignalKind::terminate())?;
        let mut sigint = setup(SignalKind::interrupt())?;
        let mut sighup = setup(SignalKind::hangup())?;

        let handler = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM");
                        handler.request_shutdown();
                    }
                    Some(()) = sigint.recv() => {
                        info!("Received SIGINT");
                        handler.request_shutdown();
                    }
                    Some(()) = sighup.recv() => {
                        info!("Received SIGHUP - requesting reconcile");
                        handler.request_reload();
                    }
                    else => break,
                }
            }
        });

        info!("OS signal handlers installed (SIGTERM, SIGINT, SIGHUP)");
        Ok(())
    }

    /// Forward Ctrl+C into this handler (non-Unix).
    #[cfg(not(unix))]
    pub fn install_os_signals(&self) -> Result<(), DaemonError> {
        let handler = self.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received Ctrl+C");
                handler.request_shutdown();
            }
        });

        info!("OS signal handlers installed (Ctrl+C only)");
        Ok(())
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
