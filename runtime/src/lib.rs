//! sparrow runtime - wires the gRPC plugins from the environment
//!
//! [`bootstrap()`] covers the usual startup: load [`Config`] from
//! `SPARROW_*` variables, initialise tracing, configure the config source
//! and build the logger. The individual steps are public for hosts that
//! need control over them.
//!
//! # Quick start
//!
//! ```ignore
//! use sparrow_runtime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let plugins = sparrow_runtime::bootstrap()?;
//!     let _guard = plugins.logger.install();
//!
//!     let current = plugins.source.read().await?;
//!     plugins.logger.logger().info(format_args!("loaded {} bytes", current.data.len()));
//!
//!     plugins.logger.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod prelude;

pub use config::{Config, LogFormat};

use anyhow::Context;
use sparrow_config_grpc::{GrpcSource, SourceConfig};
use sparrow_core::PluginError;
use sparrow_logger_grpc::level::to_tracing_level;
use sparrow_logger_grpc::{GrpcLogger, LoggerConfig, RelayReport, client};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Field every record of the runtime logger carries
pub const SERVICE_FIELD: &str = "service";

/// Runtime errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Everything [`bootstrap()`] sets up
#[derive(Debug)]
pub struct Plugins {
    pub config: Config,
    pub source: GrpcSource,
    pub logger: LoggerHandle,
}

/// Load config from the environment and build every plugin
///
/// Must be called inside a Tokio runtime. Installs the global tracing
/// subscriber, so it can only succeed once per process.
pub fn bootstrap() -> anyhow::Result<Plugins> {
    let config = Config::from_env().context("loading configuration")?;
    init_tracing(&config)?;

    info!(
        config_endpoint = %config.config_endpoint,
        config_path = %config.config_path,
        logger_endpoint = config.logger_endpoint.as_deref().unwrap_or("-"),
        service = %config.service_name,
        "Starting sparrow plugins"
    );

    let source = connect_source(&config).context("configuring config source")?;
    let logger = initialize_logger(&config).context("initializing logger")?;

    Ok(Plugins {
        config,
        source,
        logger,
    })
}

/// Install the global subscriber for the process's own diagnostics
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let default_level = to_tracing_level(config.log_level).as_str().to_ascii_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    installed.context("installing tracing subscriber")
}

/// Configure the config source; nothing is dialed until the first call
pub fn connect_source(config: &Config) -> Result<GrpcSource, RuntimeError> {
    let source = GrpcSource::connect_lazy(
        SourceConfig::new(config.config_endpoint.clone()).with_path(config.config_path.clone()),
    )?;
    Ok(source)
}

/// Build the process logger
///
/// Records carry a `service` field. With a logger endpoint configured they
/// are also relayed there. The logger is returned, not installed.
pub fn initialize_logger(config: &Config) -> Result<LoggerHandle, RuntimeError> {
    let mut logger_config = LoggerConfig::new()
        .with_level(config.log_level)
        .with_field(SERVICE_FIELD, config.service_name.clone());

    if let Some(endpoint) = &config.logger_endpoint {
        logger_config = logger_config
            .with_remote(config.service_name.clone(), client::connect_lazy(endpoint)?)
            .with_relay_capacity(config.relay_capacity);
    }

    let logger = GrpcLogger::new(logger_config)?;
    Ok(LoggerHandle {
        logger: Arc::new(logger),
    })
}

/// Owner of the process logger
#[derive(Debug, Clone)]
pub struct LoggerHandle {
    logger: Arc<GrpcLogger>,
}

impl LoggerHandle {
    pub fn logger(&self) -> &GrpcLogger {
        &self.logger
    }

    /// Shared reference for components that keep the logger
    pub fn shared(&self) -> Arc<GrpcLogger> {
        Arc::clone(&self.logger)
    }

    /// Route `tracing` events on this thread through the logger's outputs
    ///
    /// The previous default comes back when the guard drops. Events from
    /// [`RELAY_EXCLUDED_TARGETS`](sparrow_logger_grpc::RELAY_EXCLUDED_TARGETS)
    /// reach the local outputs only, never the remote relay.
    #[must_use = "dropping the guard uninstalls the logger"]
    pub fn install(&self) -> DefaultGuard {
        tracing::dispatcher::set_default(self.logger.dispatch())
    }

    /// Flush and close the remote relay, if any
    pub async fn shutdown(&self) -> Result<Option<RelayReport>, RuntimeError> {
        Ok(self.logger.shutdown().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sparrow_core::{Level, Logger};

    #[tokio::test]
    async fn test_connect_source_uses_path() {
        let config = Config {
            config_path: "/app/db".to_string(),
            ..Config::default()
        };
        let source = connect_source(&config).unwrap();
        assert_eq!(source.path(), "/app/db");
    }

    #[tokio::test]
    async fn test_bad_endpoint_is_plugin_error() {
        let config = Config {
            config_endpoint: "not a url".to_string(),
            ..Config::default()
        };
        let err = connect_source(&config).unwrap_err();
        assert!(matches!(err, RuntimeError::Plugin(PluginError::Init(_))));
    }

    #[tokio::test]
    async fn test_local_logger() {
        let config = Config {
            log_level: Level::Warn,
            service_name: "billing".to_string(),
            ..Config::default()
        };
        let handle = initialize_logger(&config).unwrap();

        assert_eq!(handle.logger().options().level, Level::Warn);
        assert_eq!(handle.logger().current_fields()[SERVICE_FIELD], "billing");
        assert!(handle.logger().relay().is_none());
        assert_eq!(handle.shutdown().await.unwrap(), None);
    }
}
