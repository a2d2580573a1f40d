//! Application wiring and lifecycle for metrond.

use crate::api;
use crate::core::{Config, MetrondError, Result};
use crate::gateway::IngestionGateway;
use crate::storage::{self, DurableBackend, Flusher, MetricStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Coordinates the store, gateway, flusher, and HTTP server.
pub struct Application {
    gateway: Arc<IngestionGateway>,
    backend: Arc<dyn DurableBackend>,
    config: Config,
}

impl Application {
    /// Build the component graph from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(MetricStore::new());
        let backend = storage::backend_from_config(&config)?;
        let gateway = Arc::new(IngestionGateway::from_config(
            &config,
            store,
            Arc::clone(&backend),
        ));

        Ok(Self {
            gateway,
            backend,
            config,
        })
    }

    /// Shared gateway handle.
    pub fn gateway(&self) -> &Arc<IngestionGateway> {
        &self.gateway
    }

    /// Run until ctrl-c, then drain within the grace period and flush.
    ///
    /// Recovery completes before the listener binds, so the service is
    /// never reachable with a half-restored store.
    pub async fn run(self) -> Result<()> {
        if self.config.storage.restore {
            self.gateway.restore_from_backend().await?;
        }

        // Inability to bind is fatal.
        let addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.http_port
        );
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| MetrondError::config(format!("failed to bind {}: {}", addr, e)))?;
        tracing::info!(addr = %addr, "listening");

        // Periodic flusher owns the backend between startup and shutdown;
        // in synchronous mode the request path flushes instead.
        let flusher = if self.config.synchronous_flush() {
            tracing::info!("synchronous flush mode, every accepted write persists");
            None
        } else {
            tracing::info!(interval = ?self.config.storage.flush_interval, "periodic flush mode");
            Some(Flusher::spawn(
                Arc::clone(self.gateway.store()),
                Arc::clone(&self.backend),
                self.config.storage.flush_interval,
            ))
        };

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let router = api::create_router(Arc::clone(&self.gateway));
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
        });

        tokio::signal::ctrl_c()
            .await
            .map_err(MetrondError::from)?;
        tracing::info!("shutdown signal received, draining");

        // Phase one: stop accepting, wait for in-flight requests bounded
        // by the grace period.
        let _ = shutdown_tx.send(true);
        let grace = self.config.server.shutdown_grace;
        let graceful = match tokio::time::timeout(grace, &mut server).await {
            Ok(joined) => {
                joined?.map_err(MetrondError::from)?;
                true
            },
            Err(_) => {
                tracing::error!(grace = ?grace, "drain exceeded grace period, terminating");
                server.abort();
                false
            },
        };

        // Phase two: stop the periodic task, then one final flush.
        if let Some(flusher) = flusher {
            flusher.shutdown().await?;
        }
        self.gateway.shutdown().await?;

        if graceful {
            tracing::info!("shutdown complete");
            Ok(())
        } else {
            Err(MetrondError::ShutdownTimeout {
                grace_secs: grace.as_secs(),
            })
        }
    }
}
