//! gRPC log writer and structured logger
//!
//! Two writers forward raw log payloads to a `sparrow.logger.v1.Logger`
//! service:
//!
//! - [`GrpcLogWriter`] - one unary `Write` per payload, returns the byte
//!   count the server reports
//! - [`RelayWriter`] - bounded queue drained by one background task into a
//!   single `WriteStream` call; never blocks the caller
//!
//! [`GrpcLogger`] implements [`sparrow_core::Logger`] on top of
//! `tracing-subscriber`, writing to local outputs and, when a remote is
//! configured, to a [`RelayWriter`].
//!
//! # Example
//!
//! ```ignore
//! use sparrow_logger_grpc::{GrpcLogger, LoggerConfig, client};
//! use sparrow_core::{Level, Logger};
//!
//! let remote = client::connect_lazy("http://logs:9000")?;
//! let logger = GrpcLogger::new(
//!     LoggerConfig::new()
//!         .with_level(Level::Debug)
//!         .with_field("region", "eu-1")
//!         .with_remote("billing", remote),
//! )?;
//!
//! logger.info(format_args!("started"));
//! logger.shutdown().await?;
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

pub mod client;
pub mod close;
pub mod config;
pub mod level;
mod logger;
pub mod metrics;
mod relay;
pub mod sink;
mod writer;

pub use close::CloseGuard;
pub use config::{EncoderConfig, Encoding, LogConfig, LoggerConfig, RemoteSink};
pub use logger::{GrpcLogger, LOGGER_NAME, RECORD_TARGET, RELAY_EXCLUDED_TARGETS};
pub use relay::{DEFAULT_RELAY_CAPACITY, RelayReport, RelayWriter};
pub use sink::{RelaySink, SinkRegistry};
pub use writer::GrpcLogWriter;
