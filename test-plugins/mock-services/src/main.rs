//! Standalone mock services
//!
//! Serves the in-memory config source and logger on `MOCK_ADDR`
//! (default `127.0.0.1:9090`). Seeds `/` with an empty JSON change-set so
//! reads succeed out of the box.

use sparrow_core::proto::config::ChangeSet;
use sparrow_mock_services::{LoggerState, SourceState, serve};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr: SocketAddr = std::env::var("MOCK_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9090".to_string())
        .parse()?;

    let source = SourceState::new();
    source.insert(
        "/",
        ChangeSet {
            data: b"{}".to_vec(),
            format: "json".to_string(),
            source: "mock".to_string(),
            ..Default::default()
        },
    );

    serve(addr, source, LoggerState::new()).await?;
    Ok(())
}
