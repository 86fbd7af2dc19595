//! Error types for sparrow plugins

use thiserror::Error;

/// Error type for plugin operations
///
/// Shared by the config source and logger adapters. RPC failures are carried
/// as the original [`tonic::Status`] so callers see exactly what the remote
/// service reported.
///
/// # Example
///
/// ```
/// use sparrow_core::PluginError;
///
/// fn close_twice() -> Result<(), PluginError> {
///     Err(PluginError::AlreadyClosed)
/// }
///
/// match close_twice() {
///     Ok(()) => println!("closed"),
///     Err(PluginError::AlreadyClosed) => println!("nothing to do"),
///     Err(e) => println!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum PluginError {
    /// Remote call failed
    ///
    /// The status is passed through unchanged, never wrapped or retried.
    #[error("rpc failed: {0}")]
    Rpc(#[from] tonic::Status),

    /// Initialization failed
    ///
    /// Examples: malformed endpoint URL, invalid sink path.
    #[error("initialization failed: {0}")]
    Init(String),

    /// Connection error
    ///
    /// Only returned by eager constructors; lazy channels report connection
    /// problems as [`PluginError::Rpc`] on first use.
    #[error("connection error: {0}")]
    Connection(String),

    /// A wire change-set could not be converted to the local representation
    #[error("invalid change set: {0}")]
    InvalidChangeSet(String),

    /// The watch stream finished without a transport error, or was stopped
    #[error("watch ended")]
    WatchEnded,

    /// Close was called on an already closed writer
    #[error("invalid operation: already closed")]
    AlreadyClosed,

    /// Write attempted after close
    #[error("writer is closed")]
    Closed,

    /// The relay queue is at capacity; the record was rejected
    #[error("relay queue full")]
    QueueFull,

    /// An output sink could not be resolved or opened
    #[error("sink error: {0}")]
    Sink(String),

    /// The background relay task failed before finishing its shutdown
    #[error("relay error: {0}")]
    Relay(String),
}

impl PluginError {
    /// Returns the remote status if this error came from an RPC
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            PluginError::Rpc(status) => Some(status),
            _ => None,
        }
    }
}
