//! Persisted preference storage for the permission flag

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Preference storage errors
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to access preference file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed preference file '{path}': {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("preference '{key}' is not a boolean")]
    WrongType { key: String },
}

/// Key-value store used to remember the permission flag across restarts
pub trait PreferenceStore {
    /// Returns Ok(None) when nothing is stored under `key`
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError>;

    /// Store `value` under `key`, synchronously
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferenceError>;
}

/// In-memory store; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, bool>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError> {
        Ok(self.entries.borrow().get(key).copied())
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferenceError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file starts out empty
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();
        let path_str = path.to_string_lossy().to_string();

        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                PreferenceError::Serialization {
                    path: path_str,
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => {
                return Err(PreferenceError::Io {
                    path: path_str,
                    source,
                })
            }
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), PreferenceError> {
        let path_str = self.path.to_string_lossy().to_string();
        let content = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            PreferenceError::Serialization {
                path: path_str.clone(),
                source,
            }
        })?;
        fs::write(&self.path, content).map_err(|source| PreferenceError::Io {
            path: path_str,
            source,
        })
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(PreferenceError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferenceError> {
        self.entries.insert(key.to_string(), Value::Bool(value));
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("geolocation_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_memory_store_shared_between_clones() {
        let mut store = MemoryStore::new();
        let observer = store.clone();
        assert_eq!(observer.get_bool("allowed").unwrap(), None);

        store.set_bool("allowed", true).unwrap();
        assert_eq!(observer.get_bool("allowed").unwrap(), Some(true));
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        let mut store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_bool("allowed").unwrap(), None);
        store.set_bool("allowed", true).unwrap();
        store.set_bool("allowed", false).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_bool("allowed").unwrap(), Some(false));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_json_store_rejects_non_boolean() {
        let path = temp_path("wrong_type");
        fs::write(&path, r#"{"allowed": "yes"}"#).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(matches!(
            store.get_bool("allowed"),
            Err(PreferenceError::WrongType { .. })
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(PreferenceError::Serialization { .. })
        ));

        let _ = fs::remove_file(&path);
    }
}
