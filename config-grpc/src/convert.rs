//! Conversion between local and wire change-sets
//!
//! The wire format stores whole Unix seconds, so a local timestamp loses its
//! sub-second part on the way out.

use bytes::Bytes;
use chrono::DateTime;
use sparrow_core::proto::config as proto;
use sparrow_core::{ChangeSet, PluginError};

/// Convert a local change-set to its wire form
pub fn to_wire(change_set: &ChangeSet) -> proto::ChangeSet {
    proto::ChangeSet {
        data: change_set.data.to_vec(),
        checksum: change_set.checksum.clone(),
        format: change_set.format.clone(),
        timestamp: change_set.timestamp.timestamp(),
        source: change_set.source.clone(),
    }
}

/// Convert a wire change-set to its local form
///
/// Fails only if the timestamp is outside the range chrono can represent.
pub fn from_wire(change_set: proto::ChangeSet) -> Result<ChangeSet, PluginError> {
    let timestamp = DateTime::from_timestamp(change_set.timestamp, 0).ok_or_else(|| {
        PluginError::InvalidChangeSet(format!(
            "timestamp {} out of range",
            change_set.timestamp
        ))
    })?;

    Ok(ChangeSet {
        data: Bytes::from(change_set.data),
        checksum: change_set.checksum,
        format: change_set.format,
        timestamp,
        source: change_set.source,
    })
}

/// Unwrap the optional change-set carried by a response and convert it
pub(crate) fn from_response(change_set: Option<proto::ChangeSet>) -> Result<ChangeSet, PluginError> {
    let change_set = change_set
        .ok_or_else(|| PluginError::InvalidChangeSet("missing change set".to_string()))?;
    from_wire(change_set)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};

    fn wire(timestamp: i64) -> proto::ChangeSet {
        proto::ChangeSet {
            data: b"host=localhost".to_vec(),
            checksum: "abc123".to_string(),
            format: "yaml".to_string(),
            timestamp,
            source: "remote".to_string(),
        }
    }

    #[test]
    fn test_from_wire_copies_fields() {
        let local = from_wire(wire(1_700_000_000)).unwrap();

        assert_eq!(local.data, Bytes::from_static(b"host=localhost"));
        assert_eq!(local.checksum, "abc123");
        assert_eq!(local.format, "yaml");
        assert_eq!(local.source, "remote");
        assert_eq!(
            local.timestamp,
            Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
        );
    }

    #[test]
    fn test_to_wire_uses_unix_seconds() {
        let local = ChangeSet::default()
            .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        assert_eq!(to_wire(&local).timestamp, 1_704_067_200);
    }

    #[test]
    fn test_round_trip_truncates_sub_seconds() {
        let precise = Utc
            .with_ymd_and_hms(2024, 6, 30, 12, 0, 5)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        let original = ChangeSet::new(&b"a=1"[..], "toml", "local")
            .with_checksum("ff00")
            .with_timestamp(precise);

        let back = from_wire(to_wire(&original)).unwrap();

        assert_eq!(back.timestamp, precise.with_nanosecond(0).unwrap());
        assert_eq!(back.data, original.data);
        assert_eq!(back.checksum, original.checksum);
        assert_eq!(back.format, original.format);
        assert_eq!(back.source, original.source);
    }

    #[test]
    fn test_round_trip_before_epoch() {
        let original =
            ChangeSet::default().with_timestamp(Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 40).unwrap());

        let back = from_wire(to_wire(&original)).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_from_wire_rejects_unrepresentable_timestamp() {
        let result = from_wire(wire(i64::MAX));
        assert!(matches!(result, Err(PluginError::InvalidChangeSet(_))));
    }

    #[test]
    fn test_from_response_requires_change_set() {
        let result = from_response(None);
        match result {
            Err(PluginError::InvalidChangeSet(msg)) => assert_eq!(msg, "missing change set"),
            other => panic!("expected InvalidChangeSet, got {other:?}"),
        }
    }
}
