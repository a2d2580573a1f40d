//! Metrond - gauge/counter telemetry server with durable persistence.
//!
//! Metrond collects two kinds of numeric telemetry from remote agents:
//! point-in-time gauges and monotonically-accumulating counters. Updates
//! are integrity-checked with a shared-secret signature, merged into a
//! concurrent in-memory store, and persisted through a pluggable durable
//! backend (file snapshot or embedded database) that seeds recovery on
//! the next start.
//!
//! # Architecture
//!
//! - `core`: domain types, configuration, and the error taxonomy
//! - `integrity`: keyed-hash verification gating every write
//! - `storage`: the concurrent metric store and durable backends
//! - `gateway`: the ingestion façade combining verify, apply, persist
//! - `api`: HTTP surface over the gateway
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use metrond_lib::core::Config;
//! use metrond_lib::Application;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let app = Application::new(config)?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod application;
pub mod cli;
pub mod core;
pub mod gateway;
pub mod integrity;
pub mod storage;

// Re-export core types for convenience
pub use crate::application::Application;
pub use crate::core::{Config, Result};
