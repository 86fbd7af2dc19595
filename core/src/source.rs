//! Config source and watcher traits
//!
//! A [`Source`] loads and stores [`ChangeSet`]s somewhere (a file, a remote
//! service, ...). [`Source::watch`] hands out a [`Watcher`] that yields every
//! subsequent change.

use crate::change_set::ChangeSet;
use crate::error::PluginError;
use async_trait::async_trait;

/// Source trait - reads, writes and watches configuration
///
/// # Implementation Requirements
///
/// - Sources must be `Send + Sync` so one instance can serve many tasks
/// - Errors from the backing store are returned as-is; sources do not retry
/// - `watch` must not consume the source; several watchers may be active
///
/// # Example
///
/// ```ignore
/// use sparrow_core::{ChangeSet, PluginError, Source, Watcher};
///
/// async fn print_updates(source: &dyn Source) -> Result<(), PluginError> {
///     let current = source.read().await?;
///     println!("{} bytes of {}", current.data.len(), current.format);
///
///     let mut watcher = source.watch().await?;
///     loop {
///         match watcher.next().await {
///             Ok(change) => println!("update from {}", change.source),
///             Err(PluginError::WatchEnded) => return Ok(()),
///             Err(e) => return Err(e),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Source: Send + Sync {
    /// Load the current change-set
    async fn read(&self) -> Result<ChangeSet, PluginError>;

    /// Store a change-set
    async fn write(&self, change_set: &ChangeSet) -> Result<(), PluginError>;

    /// Start watching for changes
    async fn watch(&self) -> Result<Box<dyn Watcher>, PluginError>;

    /// Short, fixed name identifying the source kind (e.g. "grpc", "file")
    fn name(&self) -> &'static str;
}

/// Watcher trait - a stream of change-sets from one watch call
#[async_trait]
pub trait Watcher: Send {
    /// Wait for the next change-set
    ///
    /// Returns [`PluginError::WatchEnded`] once the underlying stream has
    /// finished or the watcher was stopped. Any other error is terminal too.
    async fn next(&mut self) -> Result<ChangeSet, PluginError>;

    /// Stop watching
    ///
    /// Does not wait for in-flight updates. Stopping twice is a no-op.
    async fn stop(&mut self) -> Result<(), PluginError>;
}
