//! Durable key-value storage backing the scope store.
//!
//! The scope store persists two independent string entries. Anything that can
//! hold string-keyed strings can back it; this module provides an in-memory
//! store (isolated per instance, used by tests and embedded callers) and a
//! JSON-file store for the operator CLI.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while persisting scope entries.
#[derive(Error, Debug)]
pub enum ScopeStorageError {
    /// Reading or writing the backing file failed.
    #[error("scope storage I/O error at {path}: {source}")]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The entries could not be serialized.
    #[error("failed to serialize scope entries: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A string-keyed store of string values.
///
/// Implementations must make a successful `set` visible to every subsequent
/// `get` on the same instance.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), ScopeStorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), ScopeStorageError>;
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ScopeStorageError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ScopeStorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Key-value store persisted as a flat JSON object in a file.
///
/// Entries are loaded once at open and kept in memory; every mutation updates
/// memory first and then rewrites the file atomically (temp file + rename).
/// If the flush fails the in-memory value still wins for this process.
///
/// Concurrent writers in different processes are not coordinated; the last
/// flush wins.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens the store at `path`, creating nothing until the first write.
    ///
    /// A missing file yields an empty store. A file that is not a JSON object
    /// of strings is ignored with a warning, so a corrupted state file falls
    /// back to defaults instead of blocking startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ScopeStorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable scope file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Scope file does not exist yet");
                BTreeMap::new()
            }
            Err(source) => return Err(ScopeStorageError::Io { path, source }),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), ScopeStorageError> {
        let body = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ScopeStorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(|source| ScopeStorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| ScopeStorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ScopeStorageError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), ScopeStorageError> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}
