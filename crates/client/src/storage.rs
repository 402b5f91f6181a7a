//! Key-value storage seam.
//!
//! The browser-local-storage analog: a flat string-to-string store shared
//! by the session manager and the cart ledger under disjoint key
//! namespaces. The store is injected (constructed once per process,
//! passed by reference to consumers) so tests substitute [`MemoryStore`]
//! and the CLI uses [`JsonFileStore`].
//!
//! Storage never surfaces errors to callers: a missing key is `None`, a
//! failed disk write is logged and the in-memory view stays current.
//! Consumers layer their own "malformed means empty" policies on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A flat, synchronous string key-value store.
///
/// Operations are synchronous on purpose: read-modify-write sequences in
/// consumers hold no await point between the read and the write, which
/// keeps them atomic on a single-threaded event loop.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
    /// Drop `key` entirely. No-op when absent.
    fn remove(&self, key: &str);
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store, the test substitute.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

// =============================================================================
// JsonFileStore
// =============================================================================

/// File-backed store: a single JSON object persisted write-through.
///
/// The CLI's stand-in for browser local storage. The whole map is held in
/// memory and flushed to disk after every mutation; a file that is
/// missing or fails to parse on open starts the store empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading any existing content.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Persist the current map. Failures are logged, not propagated; the
    /// in-memory view keeps serving reads either way.
    fn flush(&self, entries: &HashMap<String, String>) {
        let serialized = match serde_json::to_string_pretty(entries) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize storage file");
                return;
            }
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to create storage directory");
            return;
        }
        if let Err(e) = std::fs::write(&self.path, serialized) {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to write storage file");
        }
    }
}

/// Read the file into a map; missing or malformed content means empty.
fn load_entries(path: &Path) -> HashMap<String, String> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "storage file is malformed, starting empty");
            HashMap::new()
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        self.flush(&entries);
    }
}
