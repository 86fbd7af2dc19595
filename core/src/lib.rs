//! sparrow-core - Shared types for the sparrow gRPC plugins
//!
//! This crate provides what both plugin adapters and their hosts agree on:
//!
//! - [`ChangeSet`] - a configuration snapshot
//! - [`Source`] / [`Watcher`] traits - async config source interface
//! - [`Logger`] trait, [`Level`], [`Fields`] - structured logging interface
//! - [`PluginError`] - error type for plugin operations
//! - [`proto`] - the generated wire types and tonic clients/servers
//!
//! # Why this crate exists
//!
//! Hosts want to depend on the interfaces without pulling in a specific
//! adapter, and the mock services used in tests need the same generated
//! types as the adapters:
//!
//! ```text
//! sparrow-core ◄── sparrow-config-grpc
//!     ▲       ◄── sparrow-logger-grpc
//!     └────────── sparrow-mock-services
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

/// Configuration change-set value object
pub mod change_set;
mod error;
/// Log levels
pub mod level;
/// Structured logger interface
pub mod logger;
mod source;

/// Types generated from `proto/sparrow/**`
pub mod proto {
    /// `sparrow.config.v1` - remote config source service
    pub mod config {
        #![allow(clippy::unwrap_used)]
        #![allow(clippy::expect_used)]
        #![allow(clippy::panic)]
        #![allow(clippy::derive_partial_eq_without_eq)]
        #![allow(missing_docs)]

        tonic::include_proto!("sparrow.config.v1");
    }

    /// `sparrow.logger.v1` - remote logging service
    pub mod logger {
        #![allow(clippy::unwrap_used)]
        #![allow(clippy::expect_used)]
        #![allow(clippy::panic)]
        #![allow(clippy::derive_partial_eq_without_eq)]
        #![allow(missing_docs)]

        tonic::include_proto!("sparrow.logger.v1");
    }
}

pub use change_set::ChangeSet;
pub use error::PluginError;
pub use level::Level;
pub use logger::{Fields, Logger, LoggerOptions};
pub use source::{Source, Watcher};
