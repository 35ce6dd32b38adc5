//! Browser `localStorage` backend for WASM.

use super::{BoxFuture, KeyValueBackend, StorageError, StorageResult};
use wasm_bindgen::JsValue;

/// Backend writing straight to `window.localStorage`.
///
/// The storage handle is looked up on every call, so the backend holds no
/// JS objects and can be created before the page finishes loading.
#[derive(Default)]
pub struct LocalStorageBackend;

impl LocalStorageBackend {
    pub fn new() -> Self {
        Self
    }
}

fn js_error(context: &str, e: JsValue) -> StorageError {
    StorageError::Other(format!("{}: {:?}", context, e))
}

fn local_storage() -> StorageResult<web_sys::Storage> {
    let window = web_sys::window()
        .ok_or_else(|| StorageError::Other("No window available".to_string()))?;
    window
        .local_storage()
        .map_err(|e| js_error("localStorage unavailable", e))?
        .ok_or_else(|| StorageError::Other("localStorage disabled".to_string()))
}

impl KeyValueBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            local_storage()?
                .get_item(&key)
                .map_err(|e| js_error("getItem failed", e))
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            // Quota errors surface here.
            local_storage()?
                .set_item(&key, &value)
                .map_err(|e| StorageError::Io(format!("setItem failed for {}: {:?}", key, e)))
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            local_storage()?
                .remove_item(&key)
                .map_err(|e| js_error("removeItem failed", e))
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let storage = local_storage()?;
            let len = storage.length().map_err(|e| js_error("length failed", e))?;
            let mut keys = Vec::with_capacity(len as usize);
            for i in 0..len {
                if let Some(key) = storage.key(i).map_err(|e| js_error("key failed", e))? {
                    keys.push(key);
                }
            }
            Ok(keys)
        })
    }
}
