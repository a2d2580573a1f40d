//! Ingestion gateway: the façade in front of the metric store.
//!
//! Every inbound update passes through the same pipeline: shape
//! validation, signature verification, store mutation, then persistence
//! according to the configured policy. Recovery and the final shutdown
//! flush also go through here so the HTTP layer never touches the
//! backend directly.

use crate::core::{Config, MetricKind, MetricUpdate, MetrondError, Result, Snapshot};
use crate::integrity::SignatureVerifier;
use crate::storage::{DurableBackend, MetricStore};
use std::str::FromStr;
use std::sync::Arc;

/// Orchestrates verification, storage mutation, and persistence.
pub struct IngestionGateway {
    store: Arc<MetricStore>,
    backend: Arc<dyn DurableBackend>,
    verifier: SignatureVerifier,
    synchronous: bool,
}

impl IngestionGateway {
    /// Create a gateway over the given store and backend.
    pub fn new(
        store: Arc<MetricStore>,
        backend: Arc<dyn DurableBackend>,
        verifier: SignatureVerifier,
        synchronous: bool,
    ) -> Self {
        Self {
            store,
            backend,
            verifier,
            synchronous,
        }
    }

    /// Create a gateway wired per configuration.
    pub fn from_config(
        config: &Config,
        store: Arc<MetricStore>,
        backend: Arc<dyn DurableBackend>,
    ) -> Self {
        Self::new(
            store,
            backend,
            SignatureVerifier::new(config.signing.key.clone()),
            config.synchronous_flush(),
        )
    }

    /// Shared store handle, for read-side consumers.
    pub fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    /// Apply one verified update to the store.
    ///
    /// A rejected update (bad shape, unknown kind, signature mismatch)
    /// never mutates the store. In synchronous mode the flush happens on
    /// this call path and a flush failure is surfaced to the submitter.
    pub async fn apply(&self, update: &MetricUpdate) -> Result<()> {
        self.apply_in_memory(update)?;

        if self.synchronous {
            self.backend.persist(self.store.snapshot()).await?;
        }
        Ok(())
    }

    /// Apply a batch of updates, flushing once at the end in synchronous
    /// mode. Processing stops at the first rejected update; everything
    /// applied before it stays applied.
    pub async fn apply_batch(&self, updates: &[MetricUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Err(MetrondError::validation("empty metrics batch"));
        }

        for update in updates {
            self.apply_in_memory(update)?;
        }

        if self.synchronous {
            self.backend.persist(self.store.snapshot()).await?;
        }
        Ok(())
    }

    fn apply_in_memory(&self, update: &MetricUpdate) -> Result<()> {
        let kind = update.validate()?;
        self.verifier.verify(update)?;

        match kind {
            MetricKind::Gauge => {
                // validate() guarantees presence
                let value = update.value.unwrap_or_default();
                self.store.put_gauge(&update.id, value);
            },
            MetricKind::Counter => {
                let delta = update.delta.unwrap_or_default();
                self.store.add_counter(&update.id, delta);
            },
        }
        Ok(())
    }

    /// Fetch the current value of a metric as an update-shaped response.
    pub fn value(&self, id: &str, kind: &str) -> Result<MetricUpdate> {
        match MetricKind::from_str(kind)? {
            MetricKind::Gauge => self
                .store
                .gauge(id)
                .map(|v| MetricUpdate::gauge(id, v))
                .ok_or_else(|| MetrondError::not_found(id.to_string())),
            MetricKind::Counter => self
                .store
                .counter(id)
                .map(|v| MetricUpdate::counter(id, v))
                .ok_or_else(|| MetrondError::not_found(id.to_string())),
        }
    }

    /// Atomic bulk view of the store.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Recover the store from the durable backend. Called once at
    /// startup, before the listener binds.
    pub async fn restore_from_backend(&self) -> Result<()> {
        let snapshot = self.backend.restore().await?;
        let restored = snapshot.len();
        self.store.restore(snapshot);
        tracing::info!(metrics = restored, "store restored from durable backend");
        Ok(())
    }

    /// Probe the durable backend.
    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }

    /// Final synchronous flush, mandatory regardless of policy.
    pub async fn shutdown(&self) -> Result<()> {
        self.backend.shutdown(self.store.snapshot()).await?;
        tracing::info!("final snapshot flushed");
        Ok(())
    }
}
