//! Background sweeping of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ExpiringCache;

/// Periodically calls [`ExpiringCache::clean`] on a tokio task.
///
/// Dropping the handle without calling [`Sweeper::shutdown`] aborts the task.
pub struct Sweeper {
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn a sweeper for `cache`. Must be called within a tokio runtime.
    pub fn spawn<T>(cache: Arc<ExpiringCache<T>>, interval: Duration) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = cache.clean();
                        if evicted > 0 {
                            debug!(
                                evicted,
                                remaining = cache.len(),
                                "Sweep evicted expired entries"
                            );
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        info!(interval_ms = interval.as_millis() as u64, "Cache sweeper started");

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Stop the sweeper and wait for its task to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Cache sweeper stopped");
    }

    /// Check if the sweeper task is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
