//! gRPC config source
//!
//! Reads, writes and watches change-sets held by a remote config service.
//! Every call is a single RPC; errors are returned with the server's status
//! untouched and nothing is retried or cached.
//!
//! # Example
//!
//! ```ignore
//! use sparrow_config_grpc::{GrpcSource, SourceConfig};
//! use sparrow_core::Source;
//!
//! let source = GrpcSource::connect(
//!     SourceConfig::new("http://config:8080").with_path("/app/db"),
//! )
//! .await?;
//!
//! let current = source.read().await?;
//! let mut watcher = source.watch().await?;
//! while let Ok(change) = watcher.next().await {
//!     println!("{} changed at {}", change.source, change.timestamp);
//! }
//! ```

use crate::config::SourceConfig;
use crate::convert;
use crate::watcher::GrpcWatcher;
use async_trait::async_trait;
use sparrow_core::proto::config::source_client::SourceClient;
use sparrow_core::proto::config::{ReadRequest, WatchRequest, WriteRequest};
use sparrow_core::{ChangeSet, PluginError, Source, Watcher};
use std::fmt;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

/// Name reported by [`Source::name`]
pub const SOURCE_NAME: &str = "grpc";

/// Config source backed by a remote `sparrow.config.v1.Source` service
#[derive(Clone)]
pub struct GrpcSource {
    /// tonic clients are cheap to clone and safe to share
    client: SourceClient<Channel>,
    path: String,
}

impl GrpcSource {
    /// Wrap an existing client
    ///
    /// Only `config.path` is used; the endpoint settings belong to whoever
    /// built the client.
    pub fn new(client: SourceClient<Channel>, config: SourceConfig) -> Self {
        Self {
            client,
            path: config.path,
        }
    }

    /// Connect eagerly - fails if the endpoint is unreachable
    pub async fn connect(config: SourceConfig) -> Result<Self, PluginError> {
        let channel = endpoint(&config)?.connect().await.map_err(|e| {
            PluginError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
        })?;

        debug!(endpoint = %config.endpoint, path = %config.path, "Config source connected");
        Ok(Self::new(SourceClient::new(channel), config))
    }

    /// Configure a lazy connection
    ///
    /// Nothing is dialed until the first call, so an unreachable or wrong
    /// endpoint shows up as an RPC error from that call. Only a malformed URL
    /// is rejected here.
    pub fn connect_lazy(config: SourceConfig) -> Result<Self, PluginError> {
        let channel = endpoint(&config)?.connect_lazy();

        debug!(endpoint = %config.endpoint, path = %config.path, "Config source configured (lazy)");
        Ok(Self::new(SourceClient::new(channel), config))
    }

    /// Path sent with reads and watches
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn endpoint(config: &SourceConfig) -> Result<Endpoint, PluginError> {
    let endpoint = Endpoint::from_shared(config.endpoint.clone())
        .map_err(|e| PluginError::Init(format!("Invalid endpoint URL: {}", e)))?
        .connect_timeout(config.connect_timeout);

    Ok(match config.request_timeout {
        Some(timeout) => endpoint.timeout(timeout),
        None => endpoint,
    })
}

#[async_trait]
impl Source for GrpcSource {
    async fn read(&self) -> Result<ChangeSet, PluginError> {
        let mut client = self.client.clone();
        let response = client
            .read(ReadRequest {
                path: self.path.clone(),
            })
            .await?;

        convert::from_response(response.into_inner().change_set)
    }

    async fn write(&self, change_set: &ChangeSet) -> Result<(), PluginError> {
        let mut client = self.client.clone();
        client
            .write(WriteRequest {
                change_set: Some(convert::to_wire(change_set)),
            })
            .await?;

        Ok(())
    }

    async fn watch(&self) -> Result<Box<dyn Watcher>, PluginError> {
        let mut client = self.client.clone();
        let stream = client
            .watch(WatchRequest {
                path: self.path.clone(),
            })
            .await?
            .into_inner();

        debug!(path = %self.path, "Watch started");
        Ok(Box::new(GrpcWatcher::new(stream, self.path.clone())))
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

impl fmt::Display for GrpcSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SOURCE_NAME)
    }
}

impl fmt::Debug for GrpcSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcSource")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
