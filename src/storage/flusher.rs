//! Periodic background flush task.
//!
//! Owns the durable backend handle between startup and shutdown. Shutdown
//! signals cancellation and awaits the task's exit before the caller runs
//! the final synchronous flush, so the timer and the shutdown flush never
//! race on the same backend.

use crate::core::Result;
use crate::storage::{DurableBackend, MetricStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to the recurring flush task.
pub struct Flusher {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Flusher {
    /// Spawn a flush task that persists the current snapshot every
    /// `interval`, coalescing whatever writes happened in between.
    pub fn spawn(
        store: Arc<MetricStore>,
        backend: Arc<dyn DurableBackend>,
        interval: Duration,
    ) -> Self {
        let (cancel, mut cancelled) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so the initial
            // restore is not flushed straight back.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = backend.persist(store.snapshot()).await {
                            // The in-memory store stays authoritative;
                            // keep serving and retry on the next tick.
                            tracing::error!(error = %e, "periodic flush failed");
                        }
                    }
                    _ = cancelled.changed() => {
                        tracing::debug!("flush task cancelled");
                        break;
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Signal cancellation and wait for the task to exit.
    pub async fn shutdown(self) -> Result<()> {
        // Receiver dropping would also end the task; the explicit send
        // keeps the exit immediate.
        let _ = self.cancel.send(true);
        self.handle.await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileBackend;

    #[tokio::test]
    async fn test_periodic_flush_persists_writes() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FileBackend::new(dir.path().join("db.json")));
        let store = Arc::new(MetricStore::new());

        let flusher = Flusher::spawn(
            Arc::clone(&store),
            backend.clone() as Arc<dyn DurableBackend>,
            Duration::from_millis(20),
        );

        store.put_gauge("Alloc", 10.0);
        tokio::time::sleep(Duration::from_millis(80)).await;
        flusher.shutdown().await.unwrap();

        let restored = backend.restore().await.unwrap();
        assert_eq!(restored.gauges.get("Alloc"), Some(&10.0));
    }

    #[tokio::test]
    async fn test_shutdown_stops_flushing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FileBackend::new(dir.path().join("db.json")));
        let store = Arc::new(MetricStore::new());

        let flusher = Flusher::spawn(
            Arc::clone(&store),
            backend.clone() as Arc<dyn DurableBackend>,
            Duration::from_millis(10),
        );
        flusher.shutdown().await.unwrap();

        // Writes after shutdown never reach the backend on their own.
        store.put_gauge("Late", 1.0);
        tokio::time::sleep(Duration::from_millis(40)).await;

        let restored = backend.restore().await.unwrap();
        assert!(restored.gauges.get("Late").is_none());
    }
}
