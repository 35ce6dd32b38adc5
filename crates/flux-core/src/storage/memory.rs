//! In-memory backend.

use super::{BoxFuture, KeyValueBackend, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory backend for testing and ephemeral use.
///
/// Writes can be made to fail on demand, which is how rollback paths are
/// exercised.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    passing_writes: AtomicUsize,
    failing_writes: AtomicUsize,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `set`/`remove` fail with an IO error.
    pub fn fail_next_writes(&self, count: usize) {
        self.fail_writes_after(0, count);
    }

    /// Let `skip` writes through, then fail the following `count`.
    pub fn fail_writes_after(&self, skip: usize, count: usize) {
        self.passing_writes.store(skip, Ordering::SeqCst);
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Read a raw value synchronously.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn take_failure(&self) -> bool {
        if self.failing_writes.load(Ordering::SeqCst) == 0 {
            return false;
        }
        if self
            .passing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return false;
        }
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            Ok(entries.get(&key).cloned())
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            if self.take_failure() {
                return Err(StorageError::Io(format!("Injected write failure for {}", key)));
            }
            let mut entries = self.entries.write().map_err(lock_error)?;
            entries.insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            if self.take_failure() {
                return Err(StorageError::Io(format!("Injected write failure for {}", key)));
            }
            let mut entries = self.entries.write().map_err(lock_error)?;
            entries.remove(&key);
            Ok(())
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            Ok(entries.keys().cloned().collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;

    #[test]
    fn test_set_and_get() {
        let backend = MemoryBackend::new();
        block_on(backend.set("a", "1".to_string())).unwrap();

        assert_eq!(block_on(backend.get("a")).unwrap(), Some("1".to_string()));
        assert_eq!(block_on(backend.get("b")).unwrap(), None);
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let backend = MemoryBackend::new();
        assert!(block_on(backend.remove("missing")).is_ok());
    }

    #[test]
    fn test_injected_failures_are_consumed() {
        let backend = MemoryBackend::new();
        backend.fail_next_writes(1);

        assert!(matches!(
            block_on(backend.set("a", "1".to_string())),
            Err(StorageError::Io(_))
        ));
        assert_eq!(backend.raw("a"), None);

        block_on(backend.set("a", "2".to_string())).unwrap();
        assert_eq!(backend.raw("a"), Some("2".to_string()));
    }

    #[test]
    fn test_failure_after_skipped_writes() {
        let backend = MemoryBackend::new();
        backend.fail_writes_after(1, 1);

        block_on(backend.set("a", "1".to_string())).unwrap();
        assert!(block_on(backend.remove("a")).is_err());
        block_on(backend.set("b", "2".to_string())).unwrap();

        assert_eq!(backend.raw("a"), Some("1".to_string()));
        assert_eq!(backend.raw("b"), Some("2".to_string()));
    }

    #[test]
    fn test_keys() {
        let backend = MemoryBackend::new();
        block_on(backend.set("x", String::new())).unwrap();
        block_on(backend.set("y", String::new())).unwrap();

        let mut keys = block_on(backend.keys()).unwrap();
        keys.sort();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);
    }
}
