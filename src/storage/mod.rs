//! Metric storage: the in-memory store and its durable backends.
//!
//! The store is the authoritative copy; durable backends exist so a
//! restart can recover the last persisted snapshot.

use crate::core::{Config, Result};
use std::sync::Arc;

pub mod backend;
pub mod database;
pub mod file;
pub mod flusher;
pub mod store;

// Re-export commonly used types
pub use backend::DurableBackend;
pub use database::DatabaseBackend;
pub use file::FileBackend;
pub use flusher::Flusher;
pub use store::MetricStore;

/// Build the durable backend selected by configuration: the database
/// variant when a database path is set, the file variant otherwise.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn DurableBackend>> {
    match &config.storage.database_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using database backend");
            Ok(Arc::new(DatabaseBackend::open(path)?))
        },
        None => {
            tracing::info!(path = %config.storage.store_file.display(), "using file backend");
            Ok(Arc::new(FileBackend::new(&config.storage.store_file)))
        },
    }
}
