//! # pagesplit-core
//!
//! Split a web page into three embeddable parts: the compressed inner HTML of
//! its body, one stylesheet holding all of its CSS with every selector scoped
//! under a prefix, and the absolute URLs of its external scripts.
//!
//! ## Architecture
//!
//! - **URL resolution**: [`UrlContext`] and [`UrlResolver`] turn relative
//!   references into absolute URLs against the document they appear in
//! - **CSS**: a tolerant rule tree ([`CssDocument`]), `@import` flattening
//!   ([`CssAggregator`]), `url(...)` rebasing and selector prefixing
//! - **Compression**: fixed textual whitespace/comment stripping
//! - **Splitting**: [`PageSplitter`] runs the strip-and-collect passes
//! - **Caching**: [`ExtractionCache`] keyed by `(url, prefix)` over a
//!   [`CacheBackend`], driven by [`PageExtractor`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagesplit_core::{Config, PageExtractor};
//!
//! # async fn run() -> pagesplit_core::Result<()> {
//! let config = Config::load()?;
//! let extractor = PageExtractor::from_config(&config)?;
//!
//! let page = extractor.extract("https://example.com/", "#embed").await;
//! println!("{}", page.html);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Splitting never fails. Unreachable pages, stylesheets and imports become
//! empty contributions and are reported as [`Diagnostic`] values. Only setup
//! (configuration, cache directory, HTTP client) returns [`Error`]:
//!
//! ```rust,no_run
//! use pagesplit_core::{Config, Error, PageExtractor};
//!
//! match PageExtractor::from_config(&Config::default()) {
//!     Ok(_) => println!("ready"),
//!     Err(e @ Error::CacheDirectoryUnavailable { .. }) => eprintln!("no cache: {e}"),
//!     Err(e) => eprintln!("{} error: {e}", e.category()),
//! }
//! ```

/// Extraction cache and its storage backends
pub mod cache;
/// Whitespace and comment stripping
pub mod compress;
/// Configuration loading and defaults
pub mod config;
/// CSS rule tree, aggregation, rebasing and prefixing
pub mod css;
/// Error types and result aliases
pub mod error;
/// Cached extraction entry point
pub mod extractor;
/// HTTP fetching
pub mod fetcher;
/// Page splitting pipeline
pub mod splitter;
/// Core data types
pub mod types;
/// Relative URL resolution
pub mod url_resolver;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_support;

// Re-export commonly used types
pub use cache::{CacheBackend, CacheKey, ExtractionCache, FilesystemBackend, MemoryBackend};
pub use config::{CacheConfig, Config, ExtractConfig, FetchConfig};
pub use css::{CssAggregator, CssDocument, CssRule, Declaration, Selector};
pub use error::{Error, Result};
pub use extractor::{CacheStatus, ExtractReport, PageExtractor};
pub use fetcher::{Fetcher, PageFetch};
pub use splitter::PageSplitter;
pub use types::{Diagnostic, PageExtraction, SplitReport};
pub use url_resolver::{UrlContext, UrlResolver};
