//! sparrow-config-grpc - gRPC config source
//!
//! Implements [`sparrow_core::Source`] against a remote
//! `sparrow.config.v1.Source` service:
//!
//! ```text
//! GrpcSource ──Read/Write (unary)──────► config service
//!     │
//!     └──Watch (server stream)──► GrpcWatcher::next() ◄── one ChangeSet per message
//! ```
//!
//! Change-sets cross the wire with whole-second Unix timestamps; see
//! [`convert`].

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

pub mod config;
pub mod convert;
mod source;
mod watcher;

pub use config::{DEFAULT_ENDPOINT, DEFAULT_PATH, SourceConfig};
pub use source::{GrpcSource, SOURCE_NAME};
pub use watcher::GrpcWatcher;
