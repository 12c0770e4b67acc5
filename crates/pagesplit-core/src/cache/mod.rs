//! Content-addressed cache of extractions keyed by `(url, prefix)`.

mod key;
mod storage;

pub use key::CacheKey;
pub use storage::{CacheBackend, FilesystemBackend, MemoryBackend};

use tracing::{debug, warn};

use crate::config::DEFAULT_TTL_SECS;
use crate::{PageExtraction, Result};

/// Typed view over a [`CacheBackend`] storing [`PageExtraction`] values.
///
/// ```rust
/// use pagesplit_core::{ExtractionCache, MemoryBackend, PageExtraction};
///
/// let cache = ExtractionCache::new(MemoryBackend::new());
/// let page = PageExtraction { html: "Hi".into(), ..PageExtraction::default() };
///
/// cache.put("http://x.com/", "#w", &page);
/// assert_eq!(cache.get("http://x.com/", "#w"), Some(page));
/// assert_eq!(cache.get("http://x.com/", "#v"), None);
/// ```
#[derive(Debug)]
pub struct ExtractionCache<B> {
    backend: B,
    ttl_secs: u64,
}

impl<B: CacheBackend> ExtractionCache<B> {
    /// Cache over `backend` with the default one hour TTL.
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// Override how long stored extractions stay fresh.
    #[must_use]
    pub const fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Seconds a stored extraction stays fresh.
    pub const fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Underlying store.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Fresh extraction stored for `(url, prefix)`, if any.
    pub fn get(&self, url: &str, prefix: &str) -> Option<PageExtraction> {
        let key = CacheKey::new(url, prefix);
        let json = self.backend.get(&key)?;
        match serde_json::from_str(&json) {
            Ok(extraction) => Some(extraction),
            Err(e) => {
                warn!(%key, %url, error = %e, "undecodable cached extraction, treating as miss");
                None
            },
        }
    }

    /// Store `extraction` for `(url, prefix)`.
    pub fn put(&self, url: &str, prefix: &str, extraction: &PageExtraction) {
        let key = CacheKey::new(url, prefix);
        match serde_json::to_string(extraction) {
            Ok(json) => {
                debug!(%key, %url, prefix, "caching extraction");
                self.backend.set(&key, &json, self.ttl_secs);
            },
            Err(e) => warn!(%key, error = %e, "failed to encode extraction"),
        }
    }

    /// Remove every stored extraction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot enumerate or delete its entries.
    pub fn clear(&self) -> Result<usize> {
        self.backend.clear()
    }
}
