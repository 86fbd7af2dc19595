//! Buffered relay writer
//!
//! tracing writers are synchronous, so records cannot wait on an RPC. The
//! relay accepts each record into a bounded queue and returns at once; a
//! single background task drains the queue into one long-lived client
//! stream (`WriteStream`).
//!
//! ```text
//! write() ──try_send──► [ bounded queue ] ──► relay task ──► WriteStream
//!    │                                             │
//!    └── QueueFull when at capacity                └── drops (counted) once the stream is gone
//! ```
//!
//! [`RelayWriter::close`] is the shutdown handshake: the queue is closed, the
//! task forwards what was already queued, closes the stream and waits for
//! the server's summary.

use crate::close::CloseGuard;
use crate::metrics::{DROP_QUEUE_FULL, DROP_STREAM_CLOSED, DROP_WRITER_CLOSED, Metrics};
use bytes::Bytes;
use parking_lot::Mutex;
use sparrow_core::PluginError;
use sparrow_core::proto::logger::WriteRequest;
use sparrow_core::proto::logger::logger_client::LoggerClient;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{JoinError, JoinHandle};
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tracing::{debug, warn};

/// Queue capacity used when none is configured
pub const DEFAULT_RELAY_CAPACITY: usize = 1024;

/// What the relay task did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Records handed to the outbound stream
    pub forwarded: u64,
    /// Records dequeued after the stream had failed
    pub failed: u64,
    /// Count reported by the server, if the stream ended cleanly
    pub received: Option<i64>,
}

/// Writer that queues records for a background relay task
pub struct RelayWriter {
    service_name: String,
    capacity: usize,
    /// Taken on close; dropping it ends the relay loop
    queue: Mutex<Option<mpsc::Sender<Bytes>>>,
    task: Mutex<Option<JoinHandle<RelayReport>>>,
    guard: CloseGuard,
    dropped: Arc<AtomicU64>,
}

impl RelayWriter {
    /// Start the relay task on the current Tokio runtime
    ///
    /// A capacity of zero is raised to one.
    pub fn spawn(
        client: LoggerClient<Channel>,
        service_name: impl Into<String>,
        capacity: usize,
    ) -> Result<Self, PluginError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PluginError::Init(format!("relay needs a Tokio runtime: {e}")))?;

        // Registration failures only cost us the counters
        if let Err(e) = Metrics::init() {
            warn!(error = %e, "Relay metrics unavailable");
        }

        let service_name = service_name.into();
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        let task = runtime.spawn(relay(
            client,
            service_name.clone(),
            rx,
            Arc::clone(&dropped),
        ));

        debug!(service = %service_name, capacity, "Log relay started");
        Ok(Self {
            service_name,
            capacity,
            queue: Mutex::new(Some(tx)),
            task: Mutex::new(Some(task)),
            guard: CloseGuard::new(),
            dropped,
        })
    }

    /// Queue `payload` for forwarding and return its length
    ///
    /// Never waits: a full queue rejects the record with
    /// [`PluginError::QueueFull`].
    pub fn write(&self, payload: &[u8]) -> Result<usize, PluginError> {
        self.enqueue(payload)
    }

    /// Nothing to flush synchronously; queued records drain on their own
    pub fn sync(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Close the queue, drain it into the stream and wait for the server
    ///
    /// Fails with `AlreadyClosed` on the second call.
    pub async fn close(&self) -> Result<RelayReport, PluginError> {
        self.guard.close()?;

        drop(self.queue.lock().take());
        let task = self.task.lock().take();

        let report = match task {
            Some(task) => task
                .await
                .map_err(join_error)?,
            None => RelayReport::default(),
        };

        debug!(
            service = %self.service_name,
            forwarded = report.forwarded,
            failed = report.failed,
            dropped = self.dropped(),
            "Log relay closed"
        );
        Ok(report)
    }

    /// Whether [`close`](Self::close) has succeeded
    pub fn closed(&self) -> bool {
        self.guard.is_closed()
    }

    /// Records rejected or lost so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Service name attached to every forwarded record
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Queue `payload`, counting it as dropped if that fails
    ///
    /// For writers that have nobody to report a failure to.
    pub(crate) fn write_or_drop(&self, payload: &[u8]) {
        match self.enqueue(payload) {
            // Counted by enqueue
            Ok(_) | Err(PluginError::QueueFull) => {}
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                if let Some(m) = Metrics::get() {
                    m.record_dropped(&self.service_name, DROP_WRITER_CLOSED);
                }
            }
        }
    }

    fn enqueue(&self, payload: &[u8]) -> Result<usize, PluginError> {
        self.guard.check_open()?;

        let queue = self.queue.lock();
        let tx = queue.as_ref().ok_or(PluginError::Closed)?;

        match tx.try_send(Bytes::copy_from_slice(payload)) {
            Ok(()) => {
                if let Some(m) = Metrics::get() {
                    m.record_queued(&self.service_name);
                }
                Ok(payload.len())
            }
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                if let Some(m) = Metrics::get() {
                    m.record_dropped(&self.service_name, DROP_QUEUE_FULL);
                }
                Err(PluginError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(PluginError::Closed),
        }
    }
}

impl io::Write for &RelayWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.enqueue(buf).map_err(|e| match e {
            PluginError::QueueFull => io::Error::new(io::ErrorKind::WouldBlock, e),
            other => io::Error::new(io::ErrorKind::BrokenPipe, other),
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for RelayWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayWriter")
            .field("service_name", &self.service_name)
            .field("capacity", &self.capacity)
            .field("closed", &self.closed())
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

fn join_error(e: JoinError) -> PluginError {
    PluginError::Relay(format!("relay task failed: {e}"))
}

/// Relay loop - the only consumer of the queue
async fn relay(
    mut client: LoggerClient<Channel>,
    service_name: String,
    mut queue: mpsc::Receiver<Bytes>,
    dropped: Arc<AtomicU64>,
) -> RelayReport {
    let (stream_tx, stream_rx) = mpsc::channel::<WriteRequest>(1);

    // The call runs in its own task so the request body is polled while
    // this loop feeds it.
    let call = tokio::spawn(async move { client.write_stream(ReceiverStream::new(stream_rx)).await });

    let mut report = RelayReport::default();
    let mut stream_open = true;

    while let Some(payload) = queue.recv().await {
        let record = WriteRequest {
            service_name: service_name.clone(),
            data: payload.to_vec(),
        };

        if stream_open && stream_tx.send(record).await.is_ok() {
            report.forwarded += 1;
            if let Some(m) = Metrics::get() {
                m.record_forwarded(&service_name);
            }
            continue;
        }

        if stream_open {
            warn!(service = %service_name, "Log stream closed, dropping records until shutdown");
            stream_open = false;
        }
        report.failed += 1;
        dropped.fetch_add(1, Ordering::Relaxed);
        if let Some(m) = Metrics::get() {
            m.record_dropped(&service_name, DROP_STREAM_CLOSED);
        }
    }

    // Queue closed: end the outbound stream and collect the summary
    drop(stream_tx);
    match call.await {
        Ok(Ok(response)) => {
            report.received = Some(response.into_inner().received);
        }
        Ok(Err(status)) => {
            warn!(service = %service_name, error = %status, "Log stream ended with error");
        }
        Err(e) => {
            warn!(service = %service_name, error = %e, "Log stream task failed");
        }
    }

    report
}
