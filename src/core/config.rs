//! Configuration management for metrond.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable overrides (via the CLI layer)
//! - Validation and defaults

use crate::core::{MetrondError, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for metrond.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Storage and persistence configuration
    pub storage: StorageConfig,
    /// Update signing configuration
    pub signing: SigningConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener
    pub bind_address: IpAddr,
    /// HTTP port
    pub http_port: u16,
    /// Grace period for the two-phase shutdown drain
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

/// Storage and persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Flush interval for the durable backend; zero means every accepted
    /// write triggers a synchronous flush
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
    /// Snapshot file path for the file backend
    pub store_file: PathBuf,
    /// Database path; when set, the database backend is used instead of
    /// the file backend
    pub database_path: Option<PathBuf>,
    /// Restore the store from the durable backend at startup
    pub restore: bool,
}

/// Update signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Shared secret key; empty disables verification entirely
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            signing: SigningConfig::default(),
            debug: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".parse().expect("Valid default IP address"),
            http_port: 8080,
            shutdown_grace: Duration::from_secs(15),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            flush_interval: Duration::from_secs(300),
            store_file: PathBuf::from("/tmp/metrond-db.json"),
            database_path: None,
            restore: true,
        }
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        SigningConfig { key: String::new() }
    }
}

impl Config {
    /// Create new config with defaults.
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.http_port == 0 {
            return Err(MetrondError::config("http_port must be greater than 0"));
        }

        if self.server.shutdown_grace.is_zero() {
            return Err(MetrondError::config("shutdown_grace must be greater than zero"));
        }

        if self.storage.store_file.as_os_str().is_empty() && self.storage.database_path.is_none() {
            return Err(MetrondError::config(
                "either store_file or database_path must be set",
            ));
        }

        Ok(())
    }

    /// True when every accepted write must flush synchronously.
    pub fn synchronous_flush(&self) -> bool {
        self.storage.flush_interval.is_zero()
    }
}

/// Configuration builder for programmatic construction.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string.
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| MetrondError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set bind address.
    pub fn bind_address(mut self, addr: IpAddr) -> Self {
        self.config.server.bind_address = addr;
        self
    }

    /// Set HTTP port.
    pub fn http_port(mut self, port: u16) -> Self {
        self.config.server.http_port = port;
        self
    }

    /// Set shutdown grace period.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.server.shutdown_grace = grace;
        self
    }

    /// Set flush interval; zero selects synchronous flushing.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.storage.flush_interval = interval;
        self
    }

    /// Set snapshot file path.
    pub fn store_file(mut self, path: PathBuf) -> Self {
        self.config.storage.store_file = path;
        self
    }

    /// Select the database backend.
    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.storage.database_path = Some(path);
        self
    }

    /// Enable or disable restore at startup.
    pub fn restore(mut self, restore: bool) -> Self {
        self.config.storage.restore = restore;
        self
    }

    /// Set the signing key.
    pub fn signing_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.signing.key = key.into();
        self
    }

    /// Set debug mode.
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
