//! File-based backend for native platforms.

use super::{BoxFuture, KeyValueBackend, StorageError, StorageResult};
use std::fs;
use std::path::PathBuf;

/// File-based backend for native platforms.
///
/// Stores each key as a `.json` file in a directory.
pub struct FileBackend {
    base_path: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            if !path.exists() {
                return Ok(None);
            }
            fs::read_to_string(&path)
                .map(Some)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            fs::write(&path, value)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut keys = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        keys.push(stem.to_string());
                    }
                }
            }
            Ok(keys)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        block_on(backend.set("flux_documents", "[]".to_string())).unwrap();
        assert_eq!(
            block_on(backend.get("flux_documents")).unwrap(),
            Some("[]".to_string())
        );
        assert_eq!(block_on(backend.keys()).unwrap(), vec!["flux_documents".to_string()]);
    }

    #[test]
    fn test_file_backend_missing_key() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(block_on(backend.get("nothing")).unwrap(), None);
    }

    #[test]
    fn test_file_backend_remove() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        block_on(backend.set("k", "v".to_string())).unwrap();
        block_on(backend.remove("k")).unwrap();
        assert_eq!(block_on(backend.get("k")).unwrap(), None);
    }

    #[test]
    fn test_file_backend_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let backend = FileBackend::new(nested.clone()).unwrap();

        assert!(nested.exists());
        assert_eq!(backend.base_path(), &nested);
    }

    #[test]
    fn test_file_backend_sanitizes_key() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();

        block_on(backend.set("widget/layout:main", "{}".to_string())).unwrap();
        assert_eq!(
            block_on(backend.get("widget/layout:main")).unwrap(),
            Some("{}".to_string())
        );
    }
}
