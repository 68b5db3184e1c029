//! Persisted key-value state store
//!
//! Everything Marquee persists (the notification queue, the resume record) is
//! a JSON blob under a string key. The store is injected into the components
//! that own those keys rather than reached through an ambient singleton, so
//! tests run against [`MemoryStore`] and the shell runs against
//! [`JsonFileStore`].
//!
//! The original host guaranteed single-threaded cooperative access; here the
//! shell runs commands on a multi-threaded runtime, so both implementations
//! serialize read-modify-write through a mutex. Cross-window consistency is
//! last-write-wins on the shared file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Capacity of the change-notification channel; observers that lag simply
/// re-read the affected keys.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A change event naming the key that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
}

/// Injectable persisted key-value store.
pub trait StateStore: Send + Sync {
    /// Read the blob stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<Value>>;

    /// Write `value` under `key`. Durable before return for file-backed
    /// implementations.
    fn write(&self, key: &str, value: Value) -> Result<()>;

    /// Subscribe to change events. Every successful [`write`](Self::write)
    /// broadcasts the key it touched.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

fn recover<'a, T>(guard: std::result::Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>) -> MutexGuard<'a, T> {
    // A poisoned map still holds valid JSON values; keep going.
    guard.unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store for tests and headless use.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            changes,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Value>> {
        Ok(recover(self.entries.lock()).get(key).cloned())
    }

    fn write(&self, key: &str, value: Value) -> Result<()> {
        recover(self.entries.lock()).insert(key.to_string(), value);
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

/// File-backed store: one JSON object holding all keys.
///
/// The file is read once at open and rewritten in full on every write,
/// mirroring the "write a JSON blob to local storage on each change" model of
/// the original host.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`. A missing file starts empty; a
    /// corrupt file is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, Value>>(&raw) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), %err, "Persisted state unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(Error::StoreRead(err.to_string())),
        };

        debug!(path = %path.display(), keys = entries.len(), "State store opened");

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            changes,
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, Value>) -> Result<()> {
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw).map_err(|err| Error::StoreWrite(err.to_string()))
    }
}

impl StateStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<Value>> {
        Ok(recover(self.entries.lock()).get(key).cloned())
    }

    fn write(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = recover(self.entries.lock());
        entries.insert(key.to_string(), value);
        self.flush(&entries)?;
        drop(entries);

        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.read("history").unwrap().is_none());

        store.write("history", json!({"time": 12.5})).unwrap();
        assert_eq!(store.read("history").unwrap(), Some(json!({"time": 12.5})));
    }

    #[test]
    fn test_memory_store_broadcasts_changed_key() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        store.write("notifications", json!([])).unwrap();

        let change = changes.try_recv().unwrap();
        assert_eq!(change.key, "notifications");
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.write("history", json!({"volume": 0.7})).unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.read("history").unwrap(),
            Some(json!({"volume": 0.7}))
        );
    }

    #[test]
    fn test_file_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.read("history").unwrap().is_none());
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("state.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.write("k", json!(1)).unwrap();
        assert!(path.exists());
    }
}
