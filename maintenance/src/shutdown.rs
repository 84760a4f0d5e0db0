//! Graceful shutdown controller for the observer.
//!
//! Listens for SIGINT/SIGTERM and broadcasts a shutdown signal to all
//! subsystems via a `tokio::sync::broadcast` channel.

use tokio::signal;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::MaintenanceError;

/// Coordinates graceful shutdown across all observer subsystems.
///
/// Subsystems call [`subscribe`](Self::subscribe) to get a receiver, or await
/// [`cancelled`](Self::cancelled), which also resolves for callers that
/// arrive after the signal. Clones share the same signal.
#[derive(Clone)]
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
    done: CancellationToken,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            done: CancellationToken::new(),
        }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically. Only the first call notifies.
    pub fn shutdown(&self) {
        if self.done.is_cancelled() {
            return;
        }
        self.done.cancel();
        let _ = self.tx.send(());
    }

    pub fn is_shutdown(&self) -> bool {
        self.done.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.done.cancelled().await
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) -> Result<(), MaintenanceError> {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        #[cfg(unix)]
        let terminate = terminate.recv();

        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            res = ctrl_c => {
                res?;
                info!("received SIGINT, shutting down");
            }
            _ = terminate => { info!("received SIGTERM, shutting down"); }
            _ = self.done.cancelled() => return Ok(()),
        }

        self.shutdown();
        Ok(())
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
