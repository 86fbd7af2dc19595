//! Real gRPC flow tests
//!
//! These tests start the mock config service, drive the source through it,
//! and verify what crossed the wire in both directions.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{TimeZone, Utc};
use sparrow_config_grpc::{GrpcSource, SourceConfig};
use sparrow_core::proto::config as proto;
use sparrow_core::{ChangeSet, PluginError, Source};
use sparrow_mock_services::{SourceState, WatchScript, endpoint, spawn_default};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

async fn start(path: &str) -> (GrpcSource, Arc<SourceState>) {
    let (addr, state, _logger) = spawn_default().await.unwrap();
    let source = GrpcSource::connect(SourceConfig::new(endpoint(addr)).with_path(path))
        .await
        .unwrap();
    (source, state)
}

fn wire(data: &str, timestamp: i64) -> proto::ChangeSet {
    proto::ChangeSet {
        data: data.as_bytes().to_vec(),
        checksum: format!("sum-{data}"),
        format: "json".to_string(),
        timestamp,
        source: "remote".to_string(),
    }
}

// ============================================================================
// Read / Write
// ============================================================================

#[tokio::test]
async fn test_read_decodes_remote_change_set() {
    let (source, state) = start("/app/db").await;
    state.insert(
        "/app/db",
        proto::ChangeSet {
            data: b"host=localhost".to_vec(),
            checksum: "abc123".to_string(),
            format: "yaml".to_string(),
            timestamp: 1_700_000_000,
            source: "remote".to_string(),
        },
    );

    let cs = source.read().await.unwrap();

    assert_eq!(cs.data.as_ref(), b"host=localhost");
    assert_eq!(cs.checksum, "abc123");
    assert_eq!(cs.format, "yaml");
    assert_eq!(cs.source, "remote");
    assert_eq!(
        cs.timestamp,
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    );
}

#[tokio::test]
async fn test_write_transmits_unix_seconds() {
    let (source, state) = start("/").await;
    let cs = ChangeSet::new(&b"{\"debug\":true}"[..], "json", "local")
        .with_checksum("c0ffee")
        .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

    source.write(&cs).await.unwrap();

    let writes = state.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].timestamp, 1_704_067_200);
    assert_eq!(writes[0].data, b"{\"debug\":true}".to_vec());
    assert_eq!(writes[0].checksum, "c0ffee");
    assert_eq!(writes[0].format, "json");
    assert_eq!(writes[0].source, "local");
}

#[tokio::test]
async fn test_write_error_propagates_status_unchanged() {
    let (source, state) = start("/").await;
    state.fail_with(tonic::Status::permission_denied("read-only store"));

    let err = source.write(&ChangeSet::default()).await.unwrap_err();

    let status = err.status().expect("RPC error");
    assert_eq!(status.code(), tonic::Code::PermissionDenied);
    assert_eq!(status.message(), "read-only store");
}

#[tokio::test]
async fn test_default_path_is_sent_when_unset() {
    let (addr, state, _logger) = spawn_default().await.unwrap();
    state.insert("/", wire("{}", 0));

    let source = GrpcSource::connect(SourceConfig::new(endpoint(addr)))
        .await
        .unwrap();
    source.read().await.unwrap();

    assert_eq!(state.requested_paths(), vec!["/".to_string()]);
}

#[tokio::test]
async fn test_source_as_trait_object() {
    let (source, state) = start("/").await;
    state.insert("/", wire("x", 5));

    let source: Arc<dyn Source> = Arc::new(source);
    assert_eq!(source.name(), "grpc");
    assert_eq!(source.read().await.unwrap().data.as_ref(), b"x");
}

// ============================================================================
// Watch
// ============================================================================

#[tokio::test]
async fn test_watch_yields_messages_in_order_then_terminal_error() {
    let (source, state) = start("/app").await;
    state.script_watch(WatchScript {
        messages: vec![wire("one", 1), wire("two", 2), wire("three", 3)],
        terminal: Some(tonic::Status::aborted("config service restarting")),
    });

    let mut watcher = source.watch().await.unwrap();

    for (data, ts) in [("one", 1), ("two", 2), ("three", 3)] {
        let cs = watcher.next().await.unwrap();
        assert_eq!(cs.data.as_ref(), data.as_bytes());
        assert_eq!(cs.timestamp.timestamp(), ts);
    }

    let err = watcher.next().await.unwrap_err();
    let status = err.status().expect("terminal RPC error");
    assert_eq!(status.code(), tonic::Code::Aborted);
    assert_eq!(status.message(), "config service restarting");
}

#[tokio::test]
async fn test_watch_clean_end_is_distinct_from_error() {
    let (source, state) = start("/").await;
    state.script_watch(WatchScript {
        messages: vec![wire("only", 1)],
        terminal: None,
    });

    let mut watcher = source.watch().await.unwrap();
    assert!(watcher.next().await.is_ok());
    assert!(matches!(watcher.next().await, Err(PluginError::WatchEnded)));
}

#[tokio::test]
async fn test_watch_sends_path() {
    let (source, state) = start("/feature-flags").await;
    state.script_watch(WatchScript::default());

    let _watcher = source.watch().await.unwrap();

    assert_eq!(state.watch_count(), 1);
    assert_eq!(state.requested_paths(), vec!["/feature-flags".to_string()]);
}

#[tokio::test]
async fn test_watch_follows_writes() {
    let (source, state) = start("/").await;

    let mut watcher = source.watch().await.unwrap();

    // The server subscribes to updates when it handles the call; wait until
    // the subscription exists before writing.
    for _ in 0..50 {
        if state.live_watchers() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.live_watchers(), 1);

    let cs = ChangeSet::new(&b"v2"[..], "text", "writer")
        .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    source.write(&cs).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), watcher.next())
        .await
        .expect("update within timeout")
        .unwrap();
    assert_eq!(received, cs);
}

#[tokio::test]
async fn test_watch_error_propagates() {
    let source = GrpcSource::connect_lazy(SourceConfig::new("http://127.0.0.1:1")).unwrap();
    let result = source.watch().await;

    match result {
        Err(err) => assert!(err.status().is_some()),
        Ok(_) => panic!("watch against a dead endpoint should fail"),
    }
}
