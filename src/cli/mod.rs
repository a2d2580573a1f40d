//! Command-line interface for metrond.

use crate::core::{Config, ConfigBuilder, MetrondError, Result};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Gauge/counter telemetry server with durable persistence.
#[derive(Parser, Debug)]
#[command(name = "metrond")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Bind address for the HTTP listener
    #[arg(short = 'a', long, env = "METROND_ADDRESS")]
    pub address: Option<IpAddr>,

    /// HTTP port
    #[arg(short = 'p', long, env = "METROND_PORT")]
    pub port: Option<u16>,

    /// Flush interval in seconds; 0 flushes synchronously on every write
    #[arg(short = 'i', long, env = "METROND_STORE_INTERVAL")]
    pub store_interval: Option<u64>,

    /// Snapshot file path for the file backend
    #[arg(short = 'f', long, env = "METROND_STORE_FILE")]
    pub store_file: Option<PathBuf>,

    /// Database path; selects the database backend when set
    #[arg(short = 'd', long, env = "METROND_DATABASE")]
    pub database: Option<PathBuf>,

    /// Skip restoring the store from the durable backend at startup
    #[arg(long, env = "METROND_NO_RESTORE")]
    pub no_restore: bool,

    /// Shared signing key; empty disables update verification
    #[arg(short = 'k', long, env = "METROND_KEY")]
    pub key: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "METROND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, env = "METROND_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments / environment variables (highest priority)
    /// 2. Config file
    /// 3. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = &self.config {
            let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                MetrondError::config(format!("Failed to read config file {:?}: {}", path, e))
            })?;
            builder = builder.from_yaml(&content)?;
            tracing::info!("Loaded configuration from: {:?}", path);
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(addr) = self.address {
            builder = builder.bind_address(addr);
        }
        if let Some(port) = self.port {
            builder = builder.http_port(port);
        }
        if let Some(secs) = self.store_interval {
            builder = builder.flush_interval(Duration::from_secs(secs));
        }
        if let Some(path) = &self.store_file {
            builder = builder.store_file(path.clone());
        }
        if let Some(path) = &self.database {
            builder = builder.database_path(path.clone());
        }
        if let Some(key) = &self.key {
            builder = builder.signing_key(key.clone());
        }
        if self.no_restore {
            builder = builder.restore(false);
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level =
            std::env::var("METROND_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).compact())
            .try_init()
            .map_err(|e| MetrondError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the metrond application.
pub async fn execute(cli: Cli) -> Result<()> {
    cli.init_logging()?;

    let config = cli.load_config().await?;

    if cli.check_config {
        config.validate()?;
        println!("Configuration is valid!");
        println!("  Address: {}:{}", config.server.bind_address, config.server.http_port);
        println!("  Flush interval: {:?}", config.storage.flush_interval);
        println!("  Store file: {}", config.storage.store_file.display());
        println!("  Signing: {}", if config.signing.key.is_empty() { "disabled" } else { "enabled" });
        return Ok(());
    }

    let app = crate::application::Application::new(config)?;
    app.run().await
}
