use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::StoreError;

/// String key/value storage holding whole JSON snapshots.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process storage, used by tests and as a scratch store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`. Writes go to `<key>.json.tmp` and
/// are renamed into place, so a reader never sees a partial snapshot.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.contains(&['/', '\\'][..]) || key.starts_with('.') {
            return Err(StoreError::Backend(format!("unusable storage key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");
        fs::create_dir_all(&self.dir)?;
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_overwrites_values() {
        let mut backend = MemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);
        backend.set("k", "1").unwrap();
        backend.set("k", "2").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("2"));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn file_backend_replaces_snapshot_without_leftovers() {
        let dir = std::env::temp_dir()
            .join(format!("occupancy-backend-{}", uuid::Uuid::new_v4().simple()));
        let mut backend = FileBackend::new(&dir);
        backend.set("setup", "[1]").unwrap();
        backend.set("setup", "[1,2]").unwrap();

        assert_eq!(backend.get("setup").unwrap().as_deref(), Some("[1,2]"));
        let mut names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["setup.json"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_backend_rejects_path_like_keys() {
        let backend = FileBackend::new(std::env::temp_dir());
        assert!(matches!(backend.get("../etc"), Err(StoreError::Backend(_))));
        assert!(matches!(backend.get(""), Err(StoreError::Backend(_))));
    }
}
