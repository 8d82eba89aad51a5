//! Key-value persistence boundary for the flashcard engine.
//!
//! The engine never touches the filesystem directly; it talks to a
//! [`KeyValueStore`] keyed by topic id. Two implementations are provided:
//!
//! - [`FileKeyValueStore`]: one JSON file per key under a base directory
//! - [`MemoryKeyValueStore`]: in-memory map with an optional byte capacity,
//!   used by tests and embedders

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage capacity exceeded while writing '{0}': free space or delete cards, then retry")]
    CapacityExceeded(String),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// External persistence collaborator, keyed by topic id.
///
/// Writes are terminal on failure: the engine performs no retry or backoff.
/// A missing key reads as `None`, never as an error.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// File-backed store: `{base_path}/{key}.json` per key.
pub struct FileKeyValueStore {
    base_path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("mneme").join("topics"))
            .ok_or(StorageError::DataDirNotFound)
    }

    /// Initialize the storage directory
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        Ok(())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Map a key onto a safe file stem. Keys are topic ids chosen by the user,
/// so path separators and other hostile characters are replaced.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

impl KeyValueStore for FileKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.key_path(key);
        fs::write(&path, value).map_err(|e| {
            // Out-of-space writes surface as the capacity failure the
            // caller is expected to report; everything else stays IO.
            if e.raw_os_error() == Some(28) {
                StorageError::CapacityExceeded(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// In-memory store with an optional total byte capacity.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
    capacity_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects writes once total stored bytes would exceed
    /// `capacity_bytes`.
    pub fn with_capacity_limit(capacity_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(capacity) = self.capacity_bytes {
            let projected = self.used_bytes_without(key) + key.len() + value.len();
            if projected > capacity {
                return Err(StorageError::CapacityExceeded(key.to_string()));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileKeyValueStore::new(dir.path().to_path_buf());
        store.init().unwrap();

        assert_eq!(store.read("rust").unwrap(), None);

        store.write("rust", "{\"cards\":[]}").unwrap();
        assert_eq!(store.read("rust").unwrap().as_deref(), Some("{\"cards\":[]}"));
        assert_eq!(store.keys().unwrap(), vec!["rust".to_string()]);

        store.remove("rust").unwrap();
        assert_eq!(store.read("rust").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileKeyValueStore::new(dir.path().to_path_buf());
        store.init().unwrap();

        store.write("notes/../escape", "x").unwrap();
        // Written under the base directory, not outside it
        assert_eq!(store.keys().unwrap().len(), 1);
        assert!(dir.path().join("notes----escape.json").exists());
    }

    #[test]
    fn test_memory_store_capacity_limit() {
        let mut store = MemoryKeyValueStore::with_capacity_limit(32);

        store.write("a", "0123456789").unwrap();
        let err = store.write("b", &"x".repeat(64)).unwrap_err();
        assert!(matches!(err, StorageError::CapacityExceeded(_)));

        // The failed write left the store untouched
        assert_eq!(store.read("b").unwrap(), None);
        assert_eq!(store.read("a").unwrap().as_deref(), Some("0123456789"));
    }

    #[test]
    fn test_memory_store_overwrite_frees_old_value() {
        let mut store = MemoryKeyValueStore::with_capacity_limit(24);
        store.write("k", &"a".repeat(20)).unwrap();
        // Replacing the value is judged against capacity without the old copy
        store.write("k", &"b".repeat(20)).unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("b".repeat(20).as_str()));
    }
}
