//! Prometheus metrics for the log relay

use parking_lot::Mutex;
use prometheus::{CounterVec, register_counter_vec};
use sparrow_core::PluginError;
use std::sync::OnceLock;

/// Global metrics instance
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Serializes registration so concurrent `init` calls register once
static INIT: Mutex<()> = Mutex::new(());

/// Drop reason: relay queue at capacity
pub const DROP_QUEUE_FULL: &str = "queue_full";

/// Drop reason: outbound stream to the logging service is gone
pub const DROP_STREAM_CLOSED: &str = "stream_closed";

/// Drop reason: record written after the relay was closed
pub const DROP_WRITER_CLOSED: &str = "writer_closed";

/// Relay counters, labelled by service name
pub struct Metrics {
    /// Records accepted into the relay queue
    pub records_queued: CounterVec,

    /// Records handed to the outbound stream
    pub records_forwarded: CounterVec,

    /// Records dropped (by service, reason)
    pub records_dropped: CounterVec,
}

impl Metrics {
    /// Register the counters with the default registry (idempotent)
    pub fn init() -> Result<&'static Metrics, PluginError> {
        let _guard = INIT.lock();
        if let Some(metrics) = METRICS.get() {
            return Ok(metrics);
        }

        let metrics = Metrics {
            records_queued: register_counter_vec!(
                "sparrow_log_records_queued_total",
                "Log records accepted into the relay queue",
                &["service"]
            )
            .map_err(|e| PluginError::Init(format!("records_queued: {e}")))?,

            records_forwarded: register_counter_vec!(
                "sparrow_log_records_forwarded_total",
                "Log records forwarded to the logging service",
                &["service"]
            )
            .map_err(|e| PluginError::Init(format!("records_forwarded: {e}")))?,

            records_dropped: register_counter_vec!(
                "sparrow_log_records_dropped_total",
                "Log records dropped before reaching the logging service",
                &["service", "reason"]
            )
            .map_err(|e| PluginError::Init(format!("records_dropped: {e}")))?,
        };

        Ok(METRICS.get_or_init(|| metrics))
    }

    /// Get the global metrics instance, if initialized
    pub fn get() -> Option<&'static Metrics> {
        METRICS.get()
    }

    /// Count a record accepted into the queue
    pub fn record_queued(&self, service: &str) {
        self.records_queued.with_label_values(&[service]).inc();
    }

    /// Count a record handed to the stream
    pub fn record_forwarded(&self, service: &str) {
        self.records_forwarded.with_label_values(&[service]).inc();
    }

    /// Count a dropped record
    pub fn record_dropped(&self, service: &str, reason: &str) {
        self.records_dropped
            .with_label_values(&[service, reason])
            .inc();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = Metrics::init().unwrap();
        let second = Metrics::init().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(Metrics::get().is_some());
    }

    #[test]
    fn test_dropped_counts_by_reason() {
        let metrics = Metrics::init().unwrap();
        let counter = metrics
            .records_dropped
            .with_label_values(&["metrics-test", DROP_QUEUE_FULL]);
        let before = counter.get();

        metrics.record_dropped("metrics-test", DROP_QUEUE_FULL);
        metrics.record_dropped("metrics-test", DROP_QUEUE_FULL);

        assert_eq!(counter.get() - before, 2.0);
    }
}
