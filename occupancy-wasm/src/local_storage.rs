use occupancy_store::{StorageBackend, StoreError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// Browser `localStorage`, one entry per key.
pub struct LocalStorageBackend {
    storage: Storage,
}

impl LocalStorageBackend {
    pub fn from_window() -> Result<Self, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Backend("no window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(describe)?
            .ok_or_else(|| StoreError::Backend("localStorage is unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl StorageBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(describe)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(describe)
    }
}

fn describe(err: JsValue) -> StoreError {
    StoreError::Backend(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}
