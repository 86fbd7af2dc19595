//! Configuration for [`crate::GrpcSource`]

use std::time::Duration;

/// Path read and watched when none is configured
pub const DEFAULT_PATH: &str = "/";

/// Endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

/// Default connect timeout (10 seconds)
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default request timeout (30 seconds)
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for a gRPC config source
///
/// The timeouts apply to the channel built by [`crate::GrpcSource::connect`]
/// and [`crate::GrpcSource::connect_lazy`]. They do not bound a watch
/// stream's lifetime, only the time to receive its response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Config path sent with every read and watch
    pub path: String,
    /// gRPC endpoint URL of the config service
    pub endpoint: String,
    /// Time allowed to establish the connection
    pub connect_timeout: Duration,
    /// Time allowed for each unary call
    pub request_timeout: Option<Duration>,
}

impl SourceConfig {
    /// Config for `endpoint` with every other setting at its default
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the config path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-call timeout; `None` disables it
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_is_root() {
        assert_eq!(SourceConfig::default().path, "/");
        assert_eq!(SourceConfig::new("http://config:9000").path, "/");
    }

    #[test]
    fn test_builder_overrides() {
        let config = SourceConfig::new("http://config:9000")
            .with_path("/app/db")
            .with_connect_timeout(Duration::from_secs(1))
            .with_request_timeout(None);

        assert_eq!(config.endpoint, "http://config:9000");
        assert_eq!(config.path, "/app/db");
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.request_timeout, None);
    }
}
