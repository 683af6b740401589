//! Key-scalar persistence: single string values keyed by name that survive restarts.

use crate::common::snapshot;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub const SESSION_TOKEN_KEY: &str = "session.token";
pub const DISCLAIMER_LAST_SHOWN_KEY: &str = "disclaimer.last_shown";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// All values in one versioned snapshot file, rewritten on every change.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => snapshot::deserialize(&bytes).map_err(StorageError::Serialization),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let bytes = snapshot::serialize(values).map_err(StorageError::Serialization)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("community-feed-{}", uuid::Uuid::new_v4()))
            .join("state.json")
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let path = temp_path();

        let store = FileStore::new(path.clone());
        assert_eq!(store.get(SESSION_TOKEN_KEY).unwrap(), None);
        store.set(SESSION_TOKEN_KEY, "t1").unwrap();
        store.set(DISCLAIMER_LAST_SHOWN_KEY, "2024-05-01").unwrap();

        let reopened = FileStore::new(path.clone());
        assert_eq!(
            reopened.get(SESSION_TOKEN_KEY).unwrap(),
            Some("t1".to_string())
        );

        reopened.remove(SESSION_TOKEN_KEY).unwrap();
        assert_eq!(store.get(SESSION_TOKEN_KEY).unwrap(), None);
        assert_eq!(
            store.get(DISCLAIMER_LAST_SHOWN_KEY).unwrap(),
            Some("2024-05-01".to_string())
        );

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not a snapshot").unwrap();

        let store = FileStore::new(path.clone());
        assert!(matches!(
            store.get("any"),
            Err(StorageError::Serialization(_))
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
