use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetrondError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Metric kind not implemented: {0}")]
    UnsupportedKind(String),

    #[error("Integrity check failed for metric: {0}")]
    Integrity(String),

    #[error("Metric not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shutdown exceeded grace period of {grace_secs}s")]
    ShutdownTimeout { grace_secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for metrond operations.
pub type Result<T> = std::result::Result<T, MetrondError>;

impl MetrondError {
    /// Creates a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a new integrity error
    pub fn integrity<S: Into<String>>(msg: S) -> Self {
        Self::Integrity(msg.into())
    }

    /// Creates a new not-found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if the error was caused by the client rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UnsupportedKind(_) | Self::Integrity(_) | Self::NotFound(_)
        )
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::UnsupportedKind(_) => "unsupported_kind",
            Self::Integrity(_) => "integrity",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) | Self::Database(_) => "storage",
            Self::Config(_) => "config",
            Self::ShutdownTimeout { .. } => "shutdown",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Join(_) => "async",
        }
    }
}
