//! Close-once bookkeeping shared by the writers

use parking_lot::Mutex;
use sparrow_core::PluginError;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether a writer has been closed
///
/// The first [`close`](Self::close) wins; later calls fail with
/// [`PluginError::AlreadyClosed`]. Reads of the flag are lock-free.
#[derive(Debug, Default)]
pub struct CloseGuard {
    closed: AtomicBool,
    lock: Mutex<()>,
}

impl CloseGuard {
    /// Open guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark closed
    pub fn close(&self) -> Result<(), PluginError> {
        let _guard = self.lock.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(PluginError::AlreadyClosed);
        }
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    /// Whether [`close`](Self::close) has succeeded
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// `Err(Closed)` once closed
    pub fn check_open(&self) -> Result<(), PluginError> {
        if self.is_closed() {
            Err(PluginError::Closed)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_close_once() {
        let guard = CloseGuard::new();
        assert!(!guard.is_closed());
        assert!(guard.check_open().is_ok());

        guard.close().unwrap();
        assert!(guard.is_closed());
        assert!(matches!(guard.check_open(), Err(PluginError::Closed)));

        let err = guard.close().unwrap_err();
        assert!(matches!(err, PluginError::AlreadyClosed));
        assert_eq!(err.to_string(), "invalid operation: already closed");
    }

    #[test]
    fn test_concurrent_close_has_one_winner() {
        let guard = Arc::new(CloseGuard::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                std::thread::spawn(move || guard.close().is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
