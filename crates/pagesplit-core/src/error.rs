//! Error types and handling for pagesplit-core operations.
//!
//! The extraction pipeline itself never fails: unreachable pages, stylesheets,
//! and imports degrade to empty contributions and are reported through
//! [`Diagnostic`](crate::Diagnostic) values instead. The errors in this module
//! cover the edges around the pipeline:
//!
//! - **Configuration**: malformed config files or override values
//! - **Cache storage**: a cache directory that cannot be created or used
//! - **Network**: HTTP client construction and typed fetches
//!
//! ## Recovery Hints
//!
//! ```rust
//! use pagesplit_core::Error;
//!
//! let err = Error::InvalidUrl("'::': relative URL without a base".to_string());
//! assert!(!err.is_recoverable());
//! assert_eq!(err.category(), "invalid_url");
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for pagesplit-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Connection and timeout errors are recoverable, everything else
    /// (TLS, malformed request) is not.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The requested URL answered with 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL handed to a typed fetch does not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A cache entry could not be written or read back.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The cache directory cannot be created or is not a directory.
    ///
    /// This is the one fatal condition of the system: without a usable cache
    /// location no persistence guarantee can be made, so it is reported at
    /// startup instead of being degraded to a miss.
    #[error("Cache directory unavailable at '{}': {source}", path.display())]
    CacheDirectoryUnavailable {
        /// Directory that could not be prepared.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// ```rust
    /// use pagesplit_core::Error;
    /// use std::io;
    ///
    /// assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "x")).is_recoverable());
    /// assert!(!Error::Config("bad ttl".to_string()).is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Config(_) => "config",
            Self::Storage(_) => "storage",
            Self::CacheDirectoryUnavailable { .. } => "cache_directory",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        // Given: Message-carrying variants
        let cases = vec![
            (Error::NotFound("http://a.com/x".into()), "Not found"),
            (Error::InvalidUrl("::".into()), "Invalid URL"),
            (Error::Config("ttl".into()), "Configuration error"),
            (Error::Storage("disk full".into()), "Storage error"),
            (Error::Serialization("eof".into()), "Serialization error"),
        ];

        for (error, label) in cases {
            // When: Rendering for the user
            let rendered = error.to_string();

            // Then: The label is present
            assert!(rendered.contains(label), "{rendered} should contain {label}");
        }

        assert_eq!(Error::Other("plain".into()).to_string(), "plain");
    }

    #[test]
    fn test_cache_directory_error_mentions_path() {
        let err = Error::CacheDirectoryUnavailable {
            path: PathBuf::from("/nonexistent/cache"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        let rendered = err.to_string();
        assert!(rendered.contains("/nonexistent/cache"));
        assert!(rendered.contains("denied"));
        assert_eq!(err.category(), "cache_directory");
        assert!(!err.is_recoverable());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_from_io_error() {
        let error: Error = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match error {
            Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("Expected IO error variant, got {other:?}"),
        }
    }

    #[test]
    fn test_error_from_serde_json() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let error: Error = err.into();
        assert_eq!(error.category(), "serialization");
    }

    #[test]
    fn test_error_recoverability() {
        assert!(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "t")).is_recoverable());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "p")).is_recoverable());
        assert!(!Error::NotFound("x".into()).is_recoverable());
        assert!(!Error::InvalidUrl("x".into()).is_recoverable());
    }

    proptest! {
        #[test]
        fn test_config_error_with_arbitrary_messages(msg in r".{0,200}") {
            let error = Error::Config(msg.clone());
            let rendered = error.to_string();
            prop_assert!(rendered.contains("Configuration error"));
            prop_assert!(rendered.contains(&msg));
        }
    }
}
