//! Mapping between [`sparrow_core::Level`] and tracing levels
//!
//! tracing has no fatal level and its TRACE is not used for emission, so the
//! table folds: trace and debug emit at DEBUG, error and fatal at ERROR.

use sparrow_core::Level;
use tracing_subscriber::filter::LevelFilter;

/// Level a record is emitted at
pub fn to_tracing_level(level: Level) -> tracing::Level {
    match level {
        Level::Trace | Level::Debug => tracing::Level::DEBUG,
        Level::Info => tracing::Level::INFO,
        Level::Warn => tracing::Level::WARN,
        Level::Error | Level::Fatal => tracing::Level::ERROR,
    }
}

/// Reverse of [`to_tracing_level`]; TRACE reads back as debug
pub fn from_tracing_level(level: tracing::Level) -> Level {
    match level {
        tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warn,
        _ => Level::Error,
    }
}

/// Filter passing everything at or above `level`'s tracing level
pub fn level_filter(level: Level) -> LevelFilter {
    LevelFilter::from_level(to_tracing_level(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table() {
        let expected = [
            (Level::Trace, tracing::Level::DEBUG),
            (Level::Debug, tracing::Level::DEBUG),
            (Level::Info, tracing::Level::INFO),
            (Level::Warn, tracing::Level::WARN),
            (Level::Error, tracing::Level::ERROR),
            (Level::Fatal, tracing::Level::ERROR),
        ];
        for (level, tracing_level) in expected {
            assert_eq!(to_tracing_level(level), tracing_level, "{level}");
        }
    }

    #[test]
    fn test_reverse_table() {
        assert_eq!(from_tracing_level(tracing::Level::TRACE), Level::Debug);
        assert_eq!(from_tracing_level(tracing::Level::DEBUG), Level::Debug);
        assert_eq!(from_tracing_level(tracing::Level::INFO), Level::Info);
        assert_eq!(from_tracing_level(tracing::Level::WARN), Level::Warn);
        assert_eq!(from_tracing_level(tracing::Level::ERROR), Level::Error);
    }

    #[test]
    fn test_unknown_name_maps_to_info() {
        assert_eq!(to_tracing_level(Level::from_name("verbose")), tracing::Level::INFO);
    }

    #[test]
    fn test_filter() {
        assert_eq!(level_filter(Level::Trace), LevelFilter::DEBUG);
        assert_eq!(level_filter(Level::Fatal), LevelFilter::ERROR);
    }
}
