//! Graceful shutdown coordination
//!
//! One watch channel fans the stop signal out to the HTTP server and the
//! background tasks. `shutdown()` drains registered tasks against a shared
//! deadline, aborts stragglers, then checkpoints and closes the database.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::constants::SHUTDOWN_TIMEOUT_SECS;
use crate::data::SqliteService;

/// What happened to the registered tasks during shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownOutcome {
    pub finished: usize,
    pub aborted: usize,
}

#[derive(Clone)]
pub struct ShutdownService {
    tx: Arc<watch::Sender<bool>>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    database: Arc<SqliteService>,
    timeout: Duration,
}

impl ShutdownService {
    pub fn new(database: Arc<SqliteService>) -> Self {
        Self::with_timeout(database, Duration::from_secs(SHUTDOWN_TIMEOUT_SECS))
    }

    pub fn with_timeout(database: Arc<SqliteService>, timeout: Duration) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            handles: Arc::new(Mutex::new(Vec::new())),
            database,
            timeout,
        }
    }

    /// Track a background task; it is awaited (or aborted) on shutdown
    pub async fn register(&self, handle: JoinHandle<()>) {
        self.handles.lock().await.push(handle);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            tracing::debug!("Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Owned future resolving once shutdown is triggered (for axum graceful shutdown)
    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.wait_for(|&stop| stop).await;
        }
    }

    /// Stop everything: drain tasks, then flush and close the database
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.trigger();

        let handles = std::mem::take(&mut *self.handles.lock().await);
        tracing::debug!(count = handles.len(), "Draining background tasks");

        let deadline = Instant::now() + self.timeout;
        let mut outcome = ShutdownOutcome::default();
        for mut handle in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Err(e)) if e.is_panic() => {
                    tracing::warn!(error = %e, "Background task panicked");
                    outcome.finished += 1;
                }
                Ok(_) => outcome.finished += 1,
                Err(_) => {
                    handle.abort();
                    outcome.aborted += 1;
                }
            }
        }
        if outcome.aborted > 0 {
            tracing::warn!(
                aborted = outcome.aborted,
                timeout_secs = self.timeout.as_secs(),
                "Aborted background tasks that outlived the shutdown timeout"
            );
        }

        if let Err(e) = self.database.checkpoint().await {
            tracing::warn!("SQLite checkpoint failed: {}", e);
        }
        self.database.close().await;

        tracing::debug!(finished = outcome.finished, "Shutdown complete");
        outcome
    }

    /// Trigger shutdown on Ctrl+C or SIGTERM
    pub fn install_signal_handlers(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install Ctrl+C handler");
            };

            #[cfg(unix)]
            let terminate = async {
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("Failed to install SIGTERM handler")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
                _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
            }

            service.trigger();
        });
    }
}
