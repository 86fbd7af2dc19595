//! Watch session over a server-streaming `Watch` call

use crate::convert;
use async_trait::async_trait;
use sparrow_core::proto::config::WatchResponse;
use sparrow_core::{ChangeSet, PluginError, Watcher};
use tonic::Streaming;
use tracing::debug;

/// Watcher yielding one change-set per message of a `Watch` stream
///
/// Ending conditions are reported distinctly: a transport or server error is
/// returned as [`PluginError::Rpc`] with the original status, while a stream
/// the server closed cleanly (or one that was stopped) yields
/// [`PluginError::WatchEnded`].
pub struct GrpcWatcher {
    /// `None` once stopped
    stream: Option<Streaming<WatchResponse>>,
    path: String,
}

impl GrpcWatcher {
    pub(crate) fn new(stream: Streaming<WatchResponse>, path: String) -> Self {
        Self {
            stream: Some(stream),
            path,
        }
    }

    /// Path this watcher was opened for
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether [`Watcher::stop`] has been called
    pub fn is_stopped(&self) -> bool {
        self.stream.is_none()
    }
}

#[async_trait]
impl Watcher for GrpcWatcher {
    async fn next(&mut self) -> Result<ChangeSet, PluginError> {
        let stream = self.stream.as_mut().ok_or(PluginError::WatchEnded)?;

        match stream.message().await? {
            Some(response) => convert::from_response(response.change_set),
            None => {
                debug!(path = %self.path, "Watch stream closed by server");
                Err(PluginError::WatchEnded)
            }
        }
    }

    async fn stop(&mut self) -> Result<(), PluginError> {
        // Dropping the stream cancels the call; nothing is drained.
        if self.stream.take().is_some() {
            debug!(path = %self.path, "Watch stopped");
        }
        Ok(())
    }
}
