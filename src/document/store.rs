//! Key-value persistence for cached documents
//!
//! Storage failures never surface as errors: a failed read is a cache miss
//! and a failed write is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Namespace prepended to every key
const KEY_PREFIX: &str = "vocab_ui";

/// Opaque key-value cache
pub trait KeyValueStore: Send + Sync {
    /// Stored value for `key`, `None` on miss or failure
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`; failures are ignored
    fn set(&self, key: &str, value: &Value);

    /// Remove `key`; failures are ignored
    fn remove(&self, key: &str);

    /// Stored value for `key`, or `fallback`
    fn get_or(&self, key: &str, fallback: Value) -> Value {
        self.get(key).unwrap_or(fallback)
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &Value) {
        self.entries.insert(key.to_string(), value.clone());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// One JSON file per key under a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(format!("{KEY_PREFIX}:{key}").as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key, path = %path.display(), error = %e, "Cache read miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, path = %path.display(), error = %e, "Corrupt cache entry ignored");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &Value) {
        let path = self.path_for(key);
        let result = fs::create_dir_all(&self.dir)
            .and_then(|()| serde_json::to_vec(value).map_err(std::io::Error::other))
            .and_then(|bytes| fs::write(&path, bytes));

        if let Err(e) = result {
            debug!(key, path = %path.display(), error = %e, "Cache write failed");
        }
    }

    fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(e) = fs::remove_file(&path) {
            debug!(key, path = %path.display(), error = %e, "Cache remove failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        assert_eq!(store.get_or("k", json!(1)), json!(1));

        store.set("k", &json!({"a": 1}));
        assert_eq!(store.get("k"), Some(json!({"a": 1})));

        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        store.set("openapi:http://localhost:8000", &json!({"paths": {}}));
        assert_eq!(
            store.get("openapi:http://localhost:8000"),
            Some(json!({"paths": {}}))
        );
        assert_eq!(store.get("openapi:http://other"), None);
    }

    #[test]
    fn test_file_store_corrupt_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(store.path_for("k"), b"{not json").unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_file_store_write_failure_is_silent() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        // The cache "directory" is a regular file
        let store = FileStore::new(&blocker);
        store.set("k", &json!(1));
        assert_eq!(store.get("k"), None);
    }
}
