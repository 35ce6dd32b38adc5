//! Local key-value persistence and the table client built on top of it.
//!
//! Every logical table lives under a single backend key as a JSON array of
//! records. Writes rewrite the whole array before the returned future
//! resolves.

mod memory;
mod table;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local_storage;

pub use memory::MemoryBackend;
pub use table::{
    from_record, to_record, LocalDb, Query, Record, CREATED_AT, ID, TABLE_KEY_PREFIX, UPDATED_AT,
};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBackend;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageBackend;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// String key-value store in the shape of browser local storage.
///
/// On native platforms implementations must be Send + Sync.
/// On WASM these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List every stored key.
    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// String key-value store (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait KeyValueBackend {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List every stored key.
    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Shared handle to a backend.
pub type SharedBackend = Arc<dyn KeyValueBackend>;

/// Create a platform-appropriate backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_backend(config: &crate::FluxConfig) -> crate::FluxResult<SharedBackend> {
    let backend = FileBackend::new(config.storage_path()?)?;
    Ok(Arc::new(backend))
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_backend(_config: &crate::FluxConfig) -> crate::FluxResult<SharedBackend> {
    Ok(Arc::new(LocalStorageBackend::new()))
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    pollster::block_on(f)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::FluxConfig;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_default_backend_uses_storage_dir() {
        let dir = tempdir().unwrap();
        let config = FluxConfig {
            storage_dir: Some(dir.path().join("flux")),
            ..FluxConfig::default()
        };

        let backend = create_default_backend(&config).unwrap();
        let db = LocalDb::new(backend);
        let mut row = Record::new();
        row.insert("title".to_string(), json!("Work"));
        block_on(db.from("folders").insert(vec![row]).execute()).unwrap();
        assert!(dir.path().join("flux").join("flux_folders.json").exists());

        // A second backend over the same directory sees the write.
        let reopened = LocalDb::new(create_default_backend(&config).unwrap());
        let rows = block_on(reopened.from("folders").select().execute()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], json!("Work"));
    }
}
