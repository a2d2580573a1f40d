//! Durable backend trait.
//!
//! A single polymorphic persistence capability; the file and database
//! variants are interchangeable implementations chosen by configuration.

use crate::core::{Result, Snapshot};

/// Trait for durable backend implementations.
#[async_trait::async_trait]
pub trait DurableBackend: Send + Sync {
    /// Persist a full snapshot. A failed persist must leave the previous
    /// durable copy intact.
    async fn persist(&self, snapshot: Snapshot) -> Result<()>;

    /// Load the last persisted snapshot. A backend with no prior state
    /// returns an empty snapshot, not an error.
    async fn restore(&self) -> Result<Snapshot>;

    /// Probe backend availability.
    async fn ping(&self) -> Result<()>;

    /// Flush-and-close: persist a final snapshot and release resources.
    async fn shutdown(&self, snapshot: Snapshot) -> Result<()>;
}
