//! Synchronous-delivery log writer
//!
//! Each write is one unary `Write` RPC. The caller gets the byte count the
//! server reports, so delivery is confirmed per record at the cost of a
//! round trip.

use crate::close::CloseGuard;
use sparrow_core::PluginError;
use sparrow_core::proto::logger::WriteRequest;
use sparrow_core::proto::logger::logger_client::LoggerClient;
use tonic::transport::Channel;

/// Writer forwarding each payload with a unary `Write` call
pub struct GrpcLogWriter {
    client: LoggerClient<Channel>,
    service_name: String,
    guard: CloseGuard,
}

impl GrpcLogWriter {
    /// Writer tagging every payload with `service_name`
    pub fn new(client: LoggerClient<Channel>, service_name: impl Into<String>) -> Self {
        Self {
            client,
            service_name: service_name.into(),
            guard: CloseGuard::new(),
        }
    }

    /// Service name attached to every payload
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Forward `payload` and return the byte count reported by the server
    ///
    /// The count is the server's, not `payload.len()`. A negative count is
    /// reported as zero.
    pub async fn write(&self, payload: &[u8]) -> Result<usize, PluginError> {
        self.guard.check_open()?;

        let mut client = self.client.clone();
        let response = client
            .write(WriteRequest {
                service_name: self.service_name.clone(),
                data: payload.to_vec(),
            })
            .await?;

        Ok(usize::try_from(response.into_inner().n).unwrap_or(0))
    }

    /// Nothing is buffered locally
    pub fn sync(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Close the writer; a second close fails with `AlreadyClosed`
    pub fn close(&self) -> Result<(), PluginError> {
        self.guard.close()
    }

    /// Whether [`close`](Self::close) has succeeded
    pub fn closed(&self) -> bool {
        self.guard.is_closed()
    }
}

impl std::fmt::Debug for GrpcLogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcLogWriter")
            .field("service_name", &self.service_name)
            .field("closed", &self.closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client;
    use sparrow_mock_services::{endpoint, spawn_default};

    #[tokio::test]
    async fn test_write_returns_server_count() {
        let (addr, _, logs) = spawn_default().await.unwrap();
        logs.report_n(3);

        let writer = GrpcLogWriter::new(client::connect(&endpoint(addr)).await.unwrap(), "api");
        let n = writer.write(b"hello world").await.unwrap();

        assert_eq!(n, 3);
        let records = logs.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].service_name, "api");
        assert_eq!(records[0].data, b"hello world");
    }

    #[tokio::test]
    async fn test_negative_count_reported_as_zero() {
        let (addr, _, logs) = spawn_default().await.unwrap();
        logs.report_n(-1);

        let writer = GrpcLogWriter::new(client::connect(&endpoint(addr)).await.unwrap(), "api");
        assert_eq!(writer.write(b"x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let writer = GrpcLogWriter::new(client::connect_lazy("http://127.0.0.1:1").unwrap(), "api");

        assert!(!writer.closed());
        writer.close().unwrap();
        assert!(writer.closed());

        assert!(matches!(writer.write(b"late").await, Err(PluginError::Closed)));
        assert!(matches!(writer.close(), Err(PluginError::AlreadyClosed)));
    }

    #[tokio::test]
    async fn test_sync_is_noop() {
        let writer = GrpcLogWriter::new(client::connect_lazy("http://127.0.0.1:1").unwrap(), "api");
        writer.sync().unwrap();
    }
}
