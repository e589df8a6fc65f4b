//! Persisted user preferences (auto-refresh, chart ranges, page).
//!
//! A [`Storage`] maps a key to a JSON-serialized value. [`Persisted`] wraps
//! one slot: it loads once when created, falls back to the default when the
//! slot is missing or unreadable, and writes through on every change.
//!
//! Storage is best-effort. Failures are logged and swallowed; they must never
//! interrupt the dashboard.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

pub trait Storage: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&self, key: &str, raw: String);
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a map half-written.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Process-local storage. Clones share the same slots, so a second
/// `Persisted` built from a clone sees what the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        lock(&self.slots).get(key).cloned()
    }

    fn store(&self, key: &str, raw: String) {
        lock(&self.slots).insert(key.to_owned(), raw);
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// All slots in one JSON object on disk, rewritten on every store:
///
/// ```json
/// { "auto_refresh": "true", "range_thp": "\"7d\"", "wa_page": "1" }
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    slots: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens `path`, starting empty if it is missing or unreadable.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let slots = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "preferences: unreadable file, using defaults");
                BTreeMap::new()
            }),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "preferences: no file yet");
                BTreeMap::new()
            }
        };
        Self {
            path,
            slots: Mutex::new(slots),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, slots: &BTreeMap<String, String>) {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!(path = %self.path.display(), error = %e, "preferences: failed to create directory");
                return;
            }
        }

        let content = match serde_json::to_vec_pretty(slots) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "preferences: failed to serialize");
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, &content) {
            warn!(path = %self.path.display(), error = %e, "preferences: failed to write file");
        } else {
            debug!(path = %self.path.display(), bytes = content.len(), "preferences: saved");
        }
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Option<String> {
        lock(&self.slots).get(key).cloned()
    }

    fn store(&self, key: &str, raw: String) {
        let mut slots = lock(&self.slots);
        slots.insert(key.to_owned(), raw);
        self.flush(&slots);
    }
}

// ---------------------------------------------------------------------------
// Persisted<T>
// ---------------------------------------------------------------------------

/// One preference slot mirrored to storage.
pub struct Persisted<T> {
    key: &'static str,
    value: T,
    storage: Arc<dyn Storage>,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn load(storage: Arc<dyn Storage>, key: &'static str, default: T) -> Self {
        let value = match storage.load(key) {
            None => default,
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key, error = %e, "preferences: invalid stored value, using default");
                default
            }),
        };
        Self { key, value, storage }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.save();
    }

    fn save(&self) {
        match serde_json::to_string(&self.value) {
            Ok(raw) => self.storage.store(self.key, raw),
            Err(e) => warn!(key = self.key, error = %e, "preferences: failed to serialize value"),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Persisted<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persisted")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}
