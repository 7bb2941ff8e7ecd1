//! Shutdown signal handling for the daemon.
//!
//! SIGTERM and SIGINT (Ctrl+C elsewhere) request a graceful shutdown: the
//! scheduler is stopped between runs, never in the middle of one.

use std::io;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

/// Listens for OS signals and fans shutdown out to the daemon.
pub struct SignalHandler {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Installs the signal handlers and spawns the listener task.
    ///
    /// # Errors
    ///
    /// Fails if a handler cannot be installed.
    #[cfg(unix)]
    pub fn spawn_listener(&self) -> io::Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down"),
            }
            let _ = shutdown_tx.send(true);
            debug!("Signal listener stopped");
        });
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn spawn_listener(&self) -> io::Result<()> {
        let shutdown_tx = self.shutdown_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received Ctrl+C, shutting down");
                let _ = shutdown_tx.send(true);
            }
        });
        Ok(())
    }

    /// Returns a future-like signal that completes on shutdown.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_rx.clone(),
        }
    }

    /// Creates a shutdown handle that can be passed to other components.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
            rx: self.shutdown_rx.clone(),
        }
    }
}

/// Completes when shutdown is signaled.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for the shutdown signal.
    ///
    /// Also returns if every sender is gone.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|shutdown| *shutdown).await;
    }
}

/// A cloneable handle to trigger or observe shutdown.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn wait(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.rx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_is_seen_by_every_handle() {
        let handler = SignalHandler::new();
        let first = handler.shutdown_handle();
        let second = first.clone();
        assert!(!second.is_shutdown());
        first.trigger();
        assert!(second.is_shutdown());
    }

    #[tokio::test]
    async fn signal_completes_after_trigger() {
        let handler = SignalHandler::new();
        let handle = handler.shutdown_handle();
        let shutdown = handler.shutdown();

        let trigger = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        let result = tokio::time::timeout(Duration::from_millis(200), shutdown.wait()).await;
        assert!(result.is_ok());
        assert!(handle.is_shutdown());
    }

    #[tokio::test]
    async fn already_triggered_signal_completes_immediately() {
        let handler = SignalHandler::new();
        let handle = handler.shutdown_handle();
        handle.trigger();

        let result = tokio::time::timeout(Duration::from_millis(50), handle.wait().wait()).await;
        assert!(result.is_ok());
        assert!(handle.is_shutdown());
    }
}
