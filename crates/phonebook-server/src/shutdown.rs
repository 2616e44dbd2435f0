//! Graceful shutdown.
//!
//! [`ShutdownSignal`] is a cloneable flag that the accept loop and every
//! connection task wait on. [`ConnectionTracker`] hands each connection a
//! [`ConnectionToken`]; [`ConnectionTracker::drain`] resolves once every
//! token has been dropped.
//!
//! # Example
//!
//! ```rust
//! use phonebook_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! let for_task = shutdown.clone();
//!
//! for_task.trigger();
//! assert!(shutdown.is_shutdown());
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

/// A one-way flag: once triggered, every waiter wakes.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    state: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Triggers shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.state.send_replace(true) {
            tracing::debug!("Shutdown triggered");
        }
    }

    /// Returns `true` once shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves when shutdown is triggered, immediately if it already was.
    pub fn recv(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut state = self.state.subscribe();
        async move {
            // Err means every sender is gone, which can only follow a trigger
            // or the end of the program.
            let _ = state.wait_for(|triggered| *triggered).await;
        }
    }

    /// Creates a signal triggered by SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to register signal handlers");
                return std::future::pending().await;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Tracks open connections so shutdown can wait for them.
///
/// Every token holds a clone of one channel sender. Draining drops the
/// tracker's own sender and waits for the channel to close.
#[derive(Debug)]
pub struct ConnectionTracker {
    sender: mpsc::Sender<()>,
    closed: mpsc::Receiver<()>,
    active: Arc<AtomicUsize>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        let (sender, closed) = mpsc::channel(1);
        Self {
            sender,
            closed,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Registers a connection; it stays counted until the token drops.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            _sender: self.sender.clone(),
            active: Arc::clone(&self.active),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once every outstanding token has been dropped.
    pub async fn drain(self) {
        let Self {
            sender, mut closed, ..
        } = self;
        drop(sender);
        // Nothing is ever sent; `None` means the last token is gone.
        let _ = closed.recv().await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// An open connection. Dropping it releases the slot.
#[derive(Debug)]
pub struct ConnectionToken {
    _sender: mpsc::Sender<()>,
    active: Arc<AtomicUsize>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_idempotent() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());

        signal.trigger();
        signal.trigger();
        assert!(signal.is_shutdown());
    }

    #[test]
    fn test_clones_share_state() {
        let a = ShutdownSignal::default();
        let b = a.clone();
        a.trigger();
        assert!(b.is_shutdown());
    }

    #[tokio::test]
    async fn test_recv_wakes_on_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = tokio::spawn(signal.recv());

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("recv should complete")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn test_recv_after_trigger_is_immediate() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(10), signal.recv())
            .await
            .expect("recv should complete immediately");
    }

    #[test]
    fn test_tracker_counts_tokens() {
        let tracker = ConnectionTracker::new();
        let first = tracker.acquire();
        let second = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);

        drop(first);
        assert_eq!(tracker.active_connections(), 1);
        drop(second);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_drain_without_connections_is_immediate() {
        tokio::time::timeout(Duration::from_millis(10), ConnectionTracker::new().drain())
            .await
            .expect("no connections means no wait");
    }

    #[tokio::test]
    async fn test_drain_waits_for_tokens() {
        let tracker = ConnectionTracker::new();
        let token = tracker.acquire();

        let drained = tokio::spawn(tracker.drain());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!drained.is_finished());

        drop(token);
        tokio::time::timeout(Duration::from_secs(1), drained)
            .await
            .expect("drain should complete")
            .expect("task should not panic");
    }
}
