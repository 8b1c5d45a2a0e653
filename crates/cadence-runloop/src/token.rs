//! Cooperative cancellation shared between the supervisor and a job loop.
//!
//! The token is usable from both worlds: blocking code parks on a condition
//! variable, async code awaits the embedded `tokio_util` token. Cancellation
//! is monotonic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct TokenInner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
    signal: tokio_util::sync::CancellationToken,
}

/// Set-once stop signal.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: Mutex::new(false),
                condvar: Condvar::new(),
                signal: tokio_util::sync::CancellationToken::new(),
            }),
        }
    }

    /// Cancel the token, waking every waiter. Repeated calls are no-ops.
    pub fn cancel(&self) {
        {
            let mut cancelled = self.inner.cancelled.lock();
            if *cancelled {
                return;
            }
            *cancelled = true;
        }
        self.inner.condvar.notify_all();
        self.inner.signal.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Block the current thread for up to `timeout`.
    ///
    /// Returns `true` if the wait ended because the token was cancelled,
    /// `false` if the full timeout elapsed.
    pub fn interruptible_wait(&self, timeout: Duration) -> bool {
        let mut cancelled = self.inner.cancelled.lock();
        match Instant::now().checked_add(timeout) {
            Some(deadline) => {
                while !*cancelled {
                    if self
                        .inner
                        .condvar
                        .wait_until(&mut cancelled, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            }
            None => {
                while !*cancelled {
                    self.inner.condvar.wait(&mut cancelled);
                }
            }
        }
        *cancelled
    }

    /// Async counterpart of [`interruptible_wait`](Self::interruptible_wait).
    pub async fn wait(&self, timeout: Duration) -> bool {
        tokio::select! {
            _ = self.inner.signal.cancelled() => true,
            _ = tokio::time::sleep(timeout) => self.is_cancelled(),
        }
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        self.inner.signal.cancelled().await
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
