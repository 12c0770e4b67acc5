//! Core data types: the extraction result and the diagnostics produced while
//! building it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A page decomposed into embeddable parts.
///
/// Built once per `(url, prefix)` pair and never mutated afterwards; the cache
/// stores and returns it as a whole.
///
/// ```rust
/// use pagesplit_core::PageExtraction;
///
/// let extraction = PageExtraction::default();
/// assert!(extraction.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageExtraction {
    /// Compressed inner HTML of the page body, without scripts or styles.
    pub html: String,
    /// Every stylesheet of the page, imports inlined, selectors prefixed,
    /// compressed into one text.
    pub css: String,
    /// Absolute URLs of external scripts, in document order.
    pub scripts: Vec<String>,
}

impl PageExtraction {
    /// True when the page contributed nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.html.is_empty() && self.css.is_empty() && self.scripts.is_empty()
    }
}

/// A recoverable problem met during extraction.
///
/// Diagnostics never change control flow; they make silently dropped content
/// observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A page or linked stylesheet could not be fetched.
    FetchUnavailable {
        /// Absolute URL that was requested.
        url: String,
    },
    /// An `@import` target could not be fetched; the import was dropped.
    ImportUnresolvable {
        /// Resolved import URL.
        target: String,
        /// Stylesheet (or page, for inline styles) holding the import.
        stylesheet: String,
    },
    /// An import chain went deeper than the configured limit.
    ImportDepthExceeded {
        /// Import URL that was not followed.
        url: String,
    },
    /// The page had no `<body>` region; the whole document was kept.
    BodyNotFound,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchUnavailable { url } => write!(f, "could not fetch {url}"),
            Self::ImportUnresolvable { target, stylesheet } => {
                write!(f, "dropped @import of {target} from {stylesheet}")
            },
            Self::ImportDepthExceeded { url } => {
                write!(f, "import depth limit reached, not following {url}")
            },
            Self::BodyNotFound => f.write_str("no <body> element, kept the whole document"),
        }
    }
}

/// An extraction together with what went wrong while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    /// The produced extraction, possibly partially empty.
    pub extraction: PageExtraction,
    /// Recoverable problems, in the order they were met.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the page itself was fetched.
    pub page_fetched: bool,
}
