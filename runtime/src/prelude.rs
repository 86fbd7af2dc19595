//! Convenience re-exports for plugin hosts.
//!
//! ```rust
//! use sparrow_runtime::prelude::*;
//! ```

// Core types
pub use sparrow_core::{ChangeSet, Fields, Level, Logger, LoggerOptions, Source, Watcher};

// Config source
pub use sparrow_config_grpc::{GrpcSource, GrpcWatcher, SourceConfig};

// Logging
pub use sparrow_logger_grpc::{
    EncoderConfig, Encoding, GrpcLogWriter, GrpcLogger, LogConfig, LoggerConfig, RelayWriter,
};

// Error types
pub use sparrow_core::PluginError;

// Runtime
pub use crate::{Config, LoggerHandle, Plugins, RuntimeError};
