//! Configuration change-set value object

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A snapshot of configuration data as served by a config source
///
/// Equality is field-wise; there is no identity beyond the fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Raw configuration payload
    pub data: Bytes,
    /// Checksum of `data` as computed by the producer
    pub checksum: String,
    /// Encoding of `data` (e.g. "json", "yaml")
    pub format: String,
    /// When the snapshot was taken (UTC)
    pub timestamp: DateTime<Utc>,
    /// Origin label
    pub source: String,
}

impl ChangeSet {
    /// Create a change-set stamped with the current time
    pub fn new(
        data: impl Into<Bytes>,
        format: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            checksum: String::new(),
            format: format.into(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }

    /// Set the checksum
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = checksum.into();
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
