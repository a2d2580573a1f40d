//! Core domain models and configuration for metrond.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder};
pub use error::{MetrondError, Result};
pub use types::{MetricKind, MetricUpdate, Snapshot};
