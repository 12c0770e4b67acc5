//! Cached extraction: the entry point most callers want.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheBackend, ExtractionCache, FilesystemBackend};
use crate::{Config, Diagnostic, Fetcher, PageExtraction, PageSplitter, Result};

/// How the cache took part in an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Served from the cache without fetching.
    Hit,
    /// Split fresh and stored.
    Stored,
    /// Split fresh but not stored because the page itself was unavailable.
    NotStored,
}

/// Result of [`PageExtractor::extract_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    /// The extraction, cached or fresh.
    pub extraction: PageExtraction,
    /// Problems met while splitting; always empty for cache hits.
    pub diagnostics: Vec<Diagnostic>,
    /// What the cache did.
    pub cache: CacheStatus,
}

/// Splits pages through an [`ExtractionCache`].
///
/// A page that could not be fetched produces an empty extraction which is
/// returned but never stored, so an outage is not remembered for a whole TTL.
pub struct PageExtractor<B> {
    splitter: PageSplitter,
    cache: ExtractionCache<B>,
}

impl PageExtractor<FilesystemBackend> {
    /// HTTP fetching and a filesystem cache, both set up from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheDirectoryUnavailable`](crate::Error::CacheDirectoryUnavailable)
    /// if the cache directory cannot be created, or a network error if the
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = FilesystemBackend::new(&config.cache.dir)?;
        Self::with_backend(config, backend)
    }
}

impl<B: CacheBackend> PageExtractor<B> {
    /// Combine a splitter and a cache.
    pub const fn new(splitter: PageSplitter, cache: ExtractionCache<B>) -> Self {
        Self { splitter, cache }
    }

    /// HTTP fetching set up from `config` over an arbitrary backend.
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be built.
    pub fn with_backend(config: &Config, backend: B) -> Result<Self> {
        let fetcher = Fetcher::with_config(&config.fetch)?;
        let splitter = PageSplitter::new(Arc::new(fetcher))
            .with_max_import_depth(config.extract.max_import_depth);
        let cache = ExtractionCache::new(backend).with_ttl(config.cache.ttl_secs);
        Ok(Self::new(splitter, cache))
    }

    /// The underlying cache.
    pub const fn cache(&self) -> &ExtractionCache<B> {
        &self.cache
    }

    /// Cached extraction of `url` under `prefix`, splitting on a miss.
    pub async fn extract(&self, url: &str, prefix: &str) -> PageExtraction {
        self.extract_report(url, prefix, false).await.extraction
    }

    /// Split `url` without reading the cache, storing the result.
    pub async fn extract_fresh(&self, url: &str, prefix: &str) -> PageExtraction {
        self.extract_report(url, prefix, true).await.extraction
    }

    /// Extraction with diagnostics and cache status. `refresh` skips the
    /// cache read.
    pub async fn extract_report(&self, url: &str, prefix: &str, refresh: bool) -> ExtractReport {
        if refresh {
            debug!(%url, prefix, "bypassing cache read");
        } else if let Some(extraction) = self.cache.get(url, prefix) {
            info!(%url, prefix, "cache hit");
            return ExtractReport {
                extraction,
                diagnostics: Vec::new(),
                cache: CacheStatus::Hit,
            };
        } else {
            info!(%url, prefix, "cache miss");
        }

        let report = self.splitter.split_with_diagnostics(url, prefix).await;
        let cache = if report.page_fetched {
            self.cache.put(url, prefix, &report.extraction);
            CacheStatus::Stored
        } else {
            debug!(%url, "page unavailable, not caching");
            CacheStatus::NotStored
        };
        ExtractReport {
            extraction: report.extraction,
            diagnostics: report.diagnostics,
            cache,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::test_support::MapFetch;

    const URL: &str = "http://x.com/p.html";

    fn extractor(fetch: &Arc<MapFetch>) -> PageExtractor<MemoryBackend> {
        let fetcher: Arc<dyn crate::PageFetch> = fetch.clone();
        PageExtractor::new(
            PageSplitter::new(fetcher),
            ExtractionCache::new(MemoryBackend::new()),
        )
    }

    #[tokio::test]
    async fn test_second_extraction_is_served_from_cache() {
        // Given: A page and an empty cache
        let fetch = Arc::new(MapFetch::new([(URL, "<body>Hi</body>")]));
        let extractor = extractor(&fetch);

        // When: Extracting twice
        let first = extractor.extract_report(URL, "#w", false).await;
        let second = extractor.extract_report(URL, "#w", false).await;

        // Then: Only the first one fetched
        assert_eq!(first.cache, CacheStatus::Stored);
        assert_eq!(second.cache, CacheStatus::Hit);
        assert_eq!(first.extraction, second.extraction);
        assert_eq!(fetch.requests(), vec![URL]);
    }

    #[tokio::test]
    async fn test_prefix_is_part_of_the_key() {
        let fetch = Arc::new(MapFetch::new([(URL, "<body><style>p{a:b}</style></body>")]));
        let extractor = extractor(&fetch);

        let a = extractor.extract(URL, "#a").await;
        let b = extractor.extract(URL, "#b").await;

        assert_eq!(a.css, "#a p{a:b}");
        assert_eq!(b.css, "#b p{a:b}");
        assert_eq!(fetch.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_page_is_not_cached() {
        let fetch = Arc::new(MapFetch::default());
        let extractor = extractor(&fetch);

        let report = extractor.extract_report(URL, "", false).await;
        assert_eq!(report.cache, CacheStatus::NotStored);
        assert!(report.extraction.is_empty());

        extractor.extract(URL, "").await;
        assert_eq!(fetch.requests().len(), 2);
        assert!(extractor.cache().backend().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_bypasses_read_but_stores() {
        let fetch = Arc::new(MapFetch::new([(URL, "<body>v</body>")]));
        let extractor = extractor(&fetch);

        extractor.extract(URL, "").await;
        let fresh = extractor.extract_report(URL, "", true).await;

        assert_eq!(fresh.cache, CacheStatus::Stored);
        assert_eq!(fetch.requests().len(), 2);
        assert_eq!(extractor.extract_fresh(URL, "").await.html, "v");
    }
}
