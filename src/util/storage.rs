//! Durable key-value storage for the persisted session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store keeps `token` and `user` here so a restart (or the next
//! CLI invocation) resumes the same login. Writes go through [`Write`]
//! batches so a store can apply several keys as one atomic update.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors produced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file or a stored value is not valid JSON.
    #[error("storage json failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One mutation inside a storage batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Set(String, String),
    Remove(String),
}

/// String key-value store with synchronous, atomic batch writes.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Apply every write in `batch` or none of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn write_batch(&self, batch: Vec<Write>) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// See [`KeyValueStore::write_batch`].
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write_batch(vec![Write::Set(key.to_owned(), value.to_owned())])
    }

    /// # Errors
    ///
    /// See [`KeyValueStore::write_batch`].
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write_batch(vec![Write::Remove(key.to_owned())])
    }
}

/// Load and decode a JSON value stored under `key`.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the value is not valid JSON
/// for `T`. A missing key is `Ok(None)`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Encode `value` as JSON into a [`Write::Set`] for `key`.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn json_write<T: Serialize>(key: &str, value: &T) -> Result<Write, StorageError> {
    Ok(Write::Set(key.to_owned(), serde_json::to_string(value)?))
}

fn apply(map: &mut BTreeMap<String, String>, batch: Vec<Write>) {
    for write in batch {
        match write {
            Write::Set(key, value) => {
                map.insert(key, value);
            }
            Write::Remove(key) => {
                map.remove(&key);
            }
        }
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store. Used by tests and by front-ends that opt out of
/// persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored key.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn write_batch(&self, batch: Vec<Write>) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut entries, batch);
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Single JSON object file holding every key.
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// reader sees either the old or the new map, never a partial one. A file
/// that no longer parses as a map is replaced by the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staging path for writes: the full file name with `.tmp` appended.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.temp_path();
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn write_batch(&self, batch: Vec<Write>) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Json(error)) => {
                tracing::warn!(path = %self.path.display(), %error, "storage file is corrupt; replacing it");
                BTreeMap::new()
            }
            Err(error) => return Err(error),
        };
        apply(&mut map, batch);
        self.write_map(&map)
    }
}
