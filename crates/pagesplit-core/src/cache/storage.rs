//! Key/value backends for the extraction cache.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//!   3f/
//!     3fa9...e1.json   # { "key", "expires_at", "value" }
//!   a0/
//!     a07c...42.json
//! ```
//!
//! Backends never fail a lookup or a store: I/O and decode problems are
//! logged and turned into misses.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheKey;
use crate::{Error, Result};

/// Opaque string store with per-entry expiry.
pub trait CacheBackend: Send + Sync {
    /// Stored value for `key`, or `None` when absent, expired, or unreadable.
    fn get(&self, key: &CacheKey) -> Option<String>;
    /// Store `value` under `key` for `ttl_secs` seconds.
    fn set(&self, key: &CacheKey, value: &str, ttl_secs: u64);
    /// Drop every entry, returning how many were removed.
    fn clear(&self) -> Result<usize>;
}

impl<B: CacheBackend + ?Sized> CacheBackend for Box<B> {
    fn get(&self, key: &CacheKey) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &CacheKey, value: &str, ttl_secs: u64) {
        (**self).set(key, value, ttl_secs);
    }

    fn clear(&self) -> Result<usize> {
        (**self).clear()
    }
}

/// Expiry instant for an entry written now.
fn expiry_after(ttl_secs: u64) -> DateTime<Utc> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// One cache file on disk.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    key: String,
    expires_at: DateTime<Utc>,
    value: String,
}

impl CacheRecord {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Filesystem cache rooted at one directory.
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Open (creating if needed) the cache directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheDirectoryUnavailable`] if the directory cannot be
    /// created or `root` exists but is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| Error::CacheDirectoryUnavailable {
            path: root.clone(),
            source,
        })?;
        debug!(root = %root.display(), "opened cache directory");
        Ok(Self { root })
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.shard()).join(format!("{key}.json"))
    }

    fn read_record(path: &Path) -> Result<Option<CacheRecord>> {
        match fs::read_to_string(path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to read cache entry: {e}"))),
        }
    }

    fn write_record(&self, key: &CacheKey, record: &CacheRecord) -> Result<()> {
        let path = self.entry_path(key);
        if let Some(shard) = path.parent() {
            fs::create_dir_all(shard)
                .map_err(|e| Error::Storage(format!("Failed to create shard directory: {e}")))?;
        }
        let json = serde_json::to_string(record)?;

        // Atomic write: temp file + rename
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| Error::Storage(format!("Failed to write temp cache file: {e}")))?;

        // Handle Windows: remove target before rename
        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to remove existing entry: {e}")))?;
        }

        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Storage(format!("Failed to commit cache file: {e}")))
    }
}

impl CacheBackend for FilesystemBackend {
    fn get(&self, key: &CacheKey) -> Option<String> {
        let path = self.entry_path(key);
        let record = match Self::read_record(&path) {
            Ok(record) => record?,
            Err(e) => {
                warn!(%key, error = %e, "unreadable cache entry, treating as miss");
                return None;
            },
        };

        if record.key != key.as_str() {
            warn!(%key, stored = %record.key, "cache entry key mismatch, treating as miss");
            return None;
        }
        if record.is_expired() {
            debug!(%key, expired_at = %record.expires_at, "removing expired cache entry");
            if let Err(e) = fs::remove_file(&path) {
                warn!(%key, error = %e, "failed to remove expired cache entry");
            }
            return None;
        }
        Some(record.value)
    }

    fn set(&self, key: &CacheKey, value: &str, ttl_secs: u64) {
        let record = CacheRecord {
            key: key.as_str().to_string(),
            expires_at: expiry_after(ttl_secs),
            value: value.to_string(),
        };
        match self.write_record(key, &record) {
            Ok(()) => debug!(%key, ttl_secs, "stored cache entry"),
            Err(e) => warn!(%key, error = %e, "failed to store cache entry"),
        }
    }

    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?.path();
            if !shard.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&shard)? {
                let path = entry?.path();
                let is_entry = path
                    .extension()
                    .is_some_and(|ext| ext == "json" || ext == "tmp");
                if is_entry {
                    fs::remove_file(&path)?;
                    if path.extension().is_some_and(|ext| ext == "json") {
                        removed += 1;
                    }
                }
            }
            // Leaves the shard in place if anything else lives there.
            let _ = fs::remove_dir(&shard);
        }
        debug!(root = %self.root.display(), removed, "cleared cache");
        Ok(removed)
    }
}

/// In-process cache, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, (DateTime<Utc>, String)>>,
}

impl MemoryBackend {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &CacheKey) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key.as_str()) {
            Some((expires_at, _)) if Utc::now() >= *expires_at => {
                entries.remove(key.as_str());
                None
            },
            Some((_, value)) => Some(value.clone()),
            None => None,
        }
    }

    fn set(&self, key: &CacheKey, value: &str, ttl_secs: u64) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.as_str().to_string(), (expiry_after(ttl_secs), value.to_string()));
    }

    fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}
