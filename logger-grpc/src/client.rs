//! Logger client construction

use sparrow_core::PluginError;
use sparrow_core::proto::logger::logger_client::LoggerClient;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

/// Default connect timeout (10 seconds)
const CONNECT_TIMEOUT_SECS: u64 = 10;

fn endpoint(url: &str) -> Result<Endpoint, PluginError> {
    Ok(Endpoint::from_shared(url.to_string())
        .map_err(|e| PluginError::Init(format!("Invalid endpoint URL: {}", e)))?
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
}

/// Connect eagerly to a logging service
pub async fn connect(url: &str) -> Result<LoggerClient<Channel>, PluginError> {
    let channel = endpoint(url)?
        .connect()
        .await
        .map_err(|e| PluginError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

    debug!(endpoint = %url, "Logger client connected");
    Ok(LoggerClient::new(channel))
}

/// Configure a lazy client; nothing is dialed until the first call
///
/// No request timeout is set: the relay's stream stays open for the
/// lifetime of the logger.
pub fn connect_lazy(url: &str) -> Result<LoggerClient<Channel>, PluginError> {
    let channel = endpoint(url)?.connect_lazy();

    debug!(endpoint = %url, "Logger client configured (lazy)");
    Ok(LoggerClient::new(channel))
}
