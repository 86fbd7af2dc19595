//! Mock Services
//!
//! In-memory implementations of the config `Source` and `Logger` gRPC
//! services. Used by the adapter test suites and runnable standalone for
//! manual testing.
//!
//! Features:
//! - Stores change-sets per path and every write it receives
//! - Broadcasts writes to live watchers, or replays a scripted watch stream
//! - Records every log payload, unary or streamed
//! - Can be configured to fail calls (for error-path testing)

use parking_lot::RwLock;
use sparrow_core::proto::config::source_server::{Source, SourceServer};
use sparrow_core::proto::config::{
    ChangeSet, ReadRequest, ReadResponse, WatchRequest, WatchResponse, WriteRequest as SetRequest,
    WriteResponse as SetResponse,
};
use sparrow_core::proto::logger::logger_server::{Logger, LoggerServer};
use sparrow_core::proto::logger::{WriteRequest, WriteResponse, WriteStreamResponse};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, info};

/// Capacity of the broadcast channel feeding live watchers
const WATCH_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Config source
// =============================================================================

/// A scripted watch stream: these messages, then the terminal status
#[derive(Debug, Clone, Default)]
pub struct WatchScript {
    /// Change-sets sent in order
    pub messages: Vec<ChangeSet>,
    /// Status ending the stream; `None` ends it cleanly
    pub terminal: Option<Status>,
}

/// Storage behind [`MockSource`]
pub struct SourceState {
    /// Change-sets served by `Read`, keyed by path
    change_sets: RwLock<HashMap<String, ChangeSet>>,
    /// Every change-set received by `Write`, in order
    writes: RwLock<Vec<ChangeSet>>,
    /// Every path requested by `Read` or `Watch`
    requested_paths: RwLock<Vec<String>>,
    /// If set, `Read` and `Write` fail with this status
    fail_with: RwLock<Option<Status>>,
    /// If set, `Watch` replays this script instead of following writes
    watch_script: RwLock<Option<WatchScript>>,
    /// Number of `Watch` calls accepted
    watch_count: AtomicU64,
    /// Live feed of writes for watchers
    updates: broadcast::Sender<ChangeSet>,
}

impl SourceState {
    pub fn new() -> Arc<Self> {
        let (updates, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Arc::new(Self {
            change_sets: RwLock::new(HashMap::new()),
            writes: RwLock::new(Vec::new()),
            requested_paths: RwLock::new(Vec::new()),
            fail_with: RwLock::new(None),
            watch_script: RwLock::new(None),
            watch_count: AtomicU64::new(0),
            updates,
        })
    }

    /// Serve `change_set` for reads of `path`
    pub fn insert(&self, path: impl Into<String>, change_set: ChangeSet) {
        self.change_sets.write().insert(path.into(), change_set);
    }

    /// All change-sets received by `Write`
    pub fn writes(&self) -> Vec<ChangeSet> {
        self.writes.read().clone()
    }

    /// All paths requested so far
    pub fn requested_paths(&self) -> Vec<String> {
        self.requested_paths.read().clone()
    }

    /// Make `Read` and `Write` fail with `status`
    pub fn fail_with(&self, status: Status) {
        *self.fail_with.write() = Some(status);
    }

    /// Replay `script` on every subsequent `Watch`
    pub fn script_watch(&self, script: WatchScript) {
        *self.watch_script.write() = Some(script);
    }

    /// Number of accepted `Watch` calls
    pub fn watch_count(&self) -> u64 {
        self.watch_count.load(Ordering::SeqCst)
    }

    /// Number of watchers currently following writes
    pub fn live_watchers(&self) -> usize {
        self.updates.receiver_count()
    }

    /// Publish a change-set to live watchers without storing it
    pub fn publish(&self, change_set: ChangeSet) {
        // No receivers is fine: nobody is watching yet.
        let _ = self.updates.send(change_set);
    }

    fn check_failure(&self) -> Result<(), Status> {
        match self.fail_with.read().as_ref() {
            Some(status) => Err(status.clone()),
            None => Ok(()),
        }
    }
}

/// Config source service backed by [`SourceState`]
pub struct MockSource {
    state: Arc<SourceState>,
}

impl MockSource {
    pub fn new(state: Arc<SourceState>) -> Self {
        Self { state }
    }

    pub fn into_server(self) -> SourceServer<Self> {
        SourceServer::new(self)
    }
}

#[tonic::async_trait]
impl Source for MockSource {
    type WatchStream = Pin<Box<dyn Stream<Item = Result<WatchResponse, Status>> + Send>>;

    async fn read(&self, request: Request<ReadRequest>) -> Result<Response<ReadResponse>, Status> {
        let path = request.into_inner().path;
        self.state.requested_paths.write().push(path.clone());
        self.state.check_failure()?;

        let change_set = self
            .state
            .change_sets
            .read()
            .get(&path)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("no change set at {path}")))?;

        debug!(%path, "Served read");
        Ok(Response::new(ReadResponse {
            change_set: Some(change_set),
        }))
    }

    async fn write(&self, request: Request<SetRequest>) -> Result<Response<SetResponse>, Status> {
        self.state.check_failure()?;

        let change_set = request
            .into_inner()
            .change_set
            .ok_or_else(|| Status::invalid_argument("change set is required"))?;

        self.state.writes.write().push(change_set.clone());
        self.state.publish(change_set);
        Ok(Response::new(SetResponse {}))
    }

    async fn watch(
        &self,
        request: Request<WatchRequest>,
    ) -> Result<Response<Self::WatchStream>, Status> {
        let path = request.into_inner().path;
        self.state.requested_paths.write().push(path.clone());
        self.state.watch_count.fetch_add(1, Ordering::SeqCst);

        let script = self.state.watch_script.read().clone();
        if let Some(script) = script {
            debug!(%path, messages = script.messages.len(), "Replaying watch script");
            let mut items: Vec<Result<WatchResponse, Status>> = script
                .messages
                .into_iter()
                .map(|cs| {
                    Ok(WatchResponse {
                        change_set: Some(cs),
                    })
                })
                .collect();
            if let Some(status) = script.terminal {
                items.push(Err(status));
            }
            return Ok(Response::new(Box::pin(tokio_stream::iter(items))));
        }

        let mut updates = self.state.updates.subscribe();
        let output = async_stream::stream! {
            loop {
                match updates.recv().await {
                    Ok(change_set) => yield Ok(WatchResponse { change_set: Some(change_set) }),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Watcher lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Ok(Response::new(Box::pin(output)))
    }
}

// =============================================================================
// Logger
// =============================================================================

/// Storage behind [`MockLogger`]
#[derive(Default)]
pub struct LoggerState {
    /// Every payload received, unary or streamed, in arrival order
    records: RwLock<Vec<WriteRequest>>,
    /// If set, unary `Write` reports this byte count instead of the payload length
    reported_n: RwLock<Option<i64>>,
    /// If set, every call fails with this status
    fail_with: RwLock<Option<Status>>,
    /// If set, `WriteStream` fails after accepting this many payloads
    fail_stream_after: RwLock<Option<usize>>,
    /// Number of `WriteStream` calls opened
    stream_count: AtomicU64,
    /// Number of `WriteStream` calls that finished
    streams_closed: AtomicU64,
}

impl LoggerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All received payloads
    pub fn records(&self) -> Vec<WriteRequest> {
        self.records.read().clone()
    }

    /// Received payloads decoded as UTF-8 (lossy)
    pub fn lines(&self) -> Vec<String> {
        self.records
            .read()
            .iter()
            .map(|r| String::from_utf8_lossy(&r.data).into_owned())
            .collect()
    }

    /// Report `n` from every unary `Write`
    pub fn report_n(&self, n: i64) {
        *self.reported_n.write() = Some(n);
    }

    /// Make every call fail with `status`
    pub fn fail_with(&self, status: Status) {
        *self.fail_with.write() = Some(status);
    }

    /// Make `WriteStream` fail after accepting `count` payloads
    pub fn fail_stream_after(&self, count: usize) {
        *self.fail_stream_after.write() = Some(count);
    }

    /// Number of `WriteStream` calls opened
    pub fn stream_count(&self) -> u64 {
        self.stream_count.load(Ordering::SeqCst)
    }

    /// Number of `WriteStream` calls that finished
    pub fn streams_closed(&self) -> u64 {
        self.streams_closed.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), Status> {
        match self.fail_with.read().as_ref() {
            Some(status) => Err(status.clone()),
            None => Ok(()),
        }
    }
}

/// Logger service backed by [`LoggerState`]
pub struct MockLogger {
    state: Arc<LoggerState>,
}

impl MockLogger {
    pub fn new(state: Arc<LoggerState>) -> Self {
        Self { state }
    }

    pub fn into_server(self) -> LoggerServer<Self> {
        LoggerServer::new(self)
    }
}

#[tonic::async_trait]
impl Logger for MockLogger {
    async fn write(
        &self,
        request: Request<WriteRequest>,
    ) -> Result<Response<WriteResponse>, Status> {
        self.state.check_failure()?;

        let record = request.into_inner();
        let n = self
            .state
            .reported_n
            .read()
            .unwrap_or(record.data.len() as i64);
        self.state.records.write().push(record);

        Ok(Response::new(WriteResponse { n }))
    }

    async fn write_stream(
        &self,
        request: Request<Streaming<WriteRequest>>,
    ) -> Result<Response<WriteStreamResponse>, Status> {
        self.state.check_failure()?;
        self.state.stream_count.fetch_add(1, Ordering::SeqCst);

        let mut stream = request.into_inner();
        let fail_after = *self.state.fail_stream_after.read();
        let mut received = 0usize;

        let result = loop {
            if fail_after.is_some_and(|limit| received >= limit) {
                break Err(Status::unavailable("stream limit reached"));
            }
            match stream.message().await {
                Ok(Some(record)) => {
                    self.state.records.write().push(record);
                    received += 1;
                }
                Ok(None) => break Ok(()),
                Err(status) => break Err(status),
            }
        };

        self.state.streams_closed.fetch_add(1, Ordering::SeqCst);
        info!(received, "Log stream finished");

        result.map(|()| {
            Response::new(WriteStreamResponse {
                received: received as i64,
            })
        })
    }
}

// =============================================================================
// Server helpers
// =============================================================================

/// Format a bound address as a gRPC endpoint URL
pub fn endpoint(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

/// Start a server on a random local port with both services
///
/// The listener is bound before this returns, so clients may connect
/// immediately.
pub async fn spawn(
    source: Arc<SourceState>,
    logger: Arc<LoggerState>,
) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let result = Server::builder()
            .add_service(MockSource::new(source).into_server())
            .add_service(MockLogger::new(logger).into_server())
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await;
        if let Err(e) = result {
            error!(error = %e, "Mock server failed");
        }
    });

    Ok(addr)
}

/// Start a server with a fresh config source and a fresh logger
pub async fn spawn_default() -> std::io::Result<(SocketAddr, Arc<SourceState>, Arc<LoggerState>)>
{
    let source = SourceState::new();
    let logger = LoggerState::new();
    let addr = spawn(Arc::clone(&source), Arc::clone(&logger)).await?;
    Ok((addr, source, logger))
}

/// Serve both services on `addr` until the process exits
pub async fn serve(
    addr: SocketAddr,
    source: Arc<SourceState>,
    logger: Arc<LoggerState>,
) -> Result<(), tonic::transport::Error> {
    info!(%addr, "Starting mock services");

    Server::builder()
        .add_service(MockSource::new(source).into_server())
        .add_service(MockLogger::new(logger).into_server())
        .serve(addr)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn change_set(data: &str) -> ChangeSet {
        ChangeSet {
            data: data.as_bytes().to_vec(),
            checksum: "sum".to_string(),
            format: "json".to_string(),
            timestamp: 1,
            source: "mock".to_string(),
        }
    }

    #[tokio::test]
    async fn test_read_missing_path_is_not_found() {
        let service = MockSource::new(SourceState::new());

        let err = service
            .read(Request::new(ReadRequest {
                path: "/missing".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn test_write_is_recorded_and_readable_state() {
        let state = SourceState::new();
        let service = MockSource::new(Arc::clone(&state));

        service
            .write(Request::new(SetRequest {
                change_set: Some(change_set("{}")),
            }))
            .await
            .unwrap();

        assert_eq!(state.writes().len(), 1);
        assert_eq!(state.writes()[0].data, b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_write_without_change_set_is_rejected() {
        let service = MockSource::new(SourceState::new());

        let err = service
            .write(Request::new(SetRequest { change_set: None }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_configured_failure_applies_to_read() {
        let state = SourceState::new();
        state.insert("/", change_set("x"));
        state.fail_with(Status::permission_denied("nope"));
        let service = MockSource::new(state);

        let err = service
            .read(Request::new(ReadRequest {
                path: "/".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::PermissionDenied);
    }

    #[tokio::test]
    async fn test_unary_log_write_reports_length_by_default() {
        let state = LoggerState::new();
        let service = MockLogger::new(Arc::clone(&state));

        let rsp = service
            .write(Request::new(WriteRequest {
                service_name: "svc".to_string(),
                data: b"hello".to_vec(),
            }))
            .await
            .unwrap();

        assert_eq!(rsp.into_inner().n, 5);
        assert_eq!(state.lines(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_unary_log_write_reports_override() {
        let state = LoggerState::new();
        state.report_n(2);
        let service = MockLogger::new(state);

        let rsp = service
            .write(Request::new(WriteRequest {
                service_name: "svc".to_string(),
                data: b"hello".to_vec(),
            }))
            .await
            .unwrap();

        assert_eq!(rsp.into_inner().n, 2);
    }
}
