use std::fmt;

use sha2::{Digest, Sha256};

/// Content address of an extraction: `sha256(url NUL prefix)` as lowercase hex.
///
/// ```rust
/// use pagesplit_core::CacheKey;
///
/// let a = CacheKey::new("http://x.com/p.html", "#w");
/// assert_eq!(a, CacheKey::new("http://x.com/p.html", "#w"));
/// assert_ne!(a, CacheKey::new("http://x.com/p.html", "#v"));
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a `(url, prefix)` pair.
    ///
    /// The NUL separator keeps `("ab", "c")` and `("a", "bc")` apart.
    #[must_use]
    pub fn new(url: &str, prefix: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update([0u8]);
        hasher.update(prefix.as_bytes());
        let digest = hasher.finalize();

        let hex = digest.iter().fold(String::with_capacity(64), |mut acc, b| {
            use std::fmt::Write as _;
            let _ = write!(acc, "{b:02x}");
            acc
        });
        Self(hex)
    }

    /// Hex form of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First two hex characters, used as the directory level on disk.
    #[must_use]
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_is_lowercase_hex() {
        let key = CacheKey::new("http://a.com/", "");
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(key.shard(), &key.as_str()[..2]);
    }

    #[test]
    fn test_concatenation_does_not_collide() {
        assert_ne!(CacheKey::new("ab", "c"), CacheKey::new("a", "bc"));
        assert_ne!(
            CacheKey::new("http://a.com/p#w", ""),
            CacheKey::new("http://a.com/p", "#w")
        );
    }

    proptest! {
        #[test]
        fn test_key_deterministic(url in ".{0,40}", prefix in ".{0,10}") {
            prop_assert_eq!(CacheKey::new(&url, &prefix), CacheKey::new(&url, &prefix));
        }

        #[test]
        fn test_distinct_prefixes_never_collide(
            url in "https?://[a-z]{1,10}\\.com/[a-z/]{0,20}",
            p1 in "[#.a-z0-9 -]{0,10}",
            p2 in "[#.a-z0-9 -]{0,10}",
        ) {
            prop_assume!(p1 != p2);
            prop_assert_ne!(CacheKey::new(&url, &p1), CacheKey::new(&url, &p2));
        }
    }
}
