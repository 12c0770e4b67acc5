//! Relative URL resolution against an explicit base context.
//!
//! Every extraction pass builds its own [`UrlContext`] from the document it is
//! currently reading (the page, a linked stylesheet, an imported stylesheet) and
//! resolves references found in that document against it. Nothing is shared
//! between passes, so a context can never leak from one page into another.
//!
//! ```rust
//! use pagesplit_core::UrlContext;
//!
//! let ctx = UrlContext::from_base("http://a.com/dir/page.html").unwrap();
//! assert_eq!(ctx.resolve("style.css"), "http://a.com/dir/style.css");
//! assert_eq!(ctx.resolve("/x.css"), "http://a.com/x.css");
//! assert_eq!(ctx.resolve("http://b.com/y.css"), "http://b.com/y.css");
//! ```

use tracing::debug;
use url::Url;

/// Schemes whose references are opaque and never resolved.
const OPAQUE_SCHEMES: [&str; 5] = ["data:", "javascript:", "mailto:", "about:", "blob:"];

/// Resolution frame derived from a base URL.
///
/// `path` is the directory of the base document without a trailing slash, so
/// `http://a.com/dir/page.html` and `http://a.com/dir/` both give `/dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlContext {
    scheme: String,
    host: String,
    path: String,
    base: Url,
}

impl UrlContext {
    /// Derive a context from `base`, defaulting the scheme to `http`.
    ///
    /// Returns `None` for an empty base or one without a host.
    #[must_use]
    pub fn from_base(base: &str) -> Option<Self> {
        let base = base.trim();
        if base.is_empty() {
            return None;
        }

        let parsed = if base.contains("://") {
            Url::parse(base)
        } else if base.starts_with("//") {
            Url::parse(&format!("http:{base}"))
        } else {
            Url::parse(&format!("http://{base}"))
        };
        let parsed = match parsed {
            Ok(url) => url,
            Err(err) => {
                debug!(%base, error = %err, "base URL cannot establish a context");
                return None;
            },
        };

        let host = parsed.host_str()?;
        let host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let path = parsed
            .path()
            .rfind('/')
            .map_or("", |idx| &parsed.path()[..idx])
            .trim_end_matches('/')
            .to_string();
        let scheme = parsed.scheme().to_string();
        let base = Url::parse(&format!("{scheme}://{host}{path}/")).ok()?;

        Some(Self {
            scheme,
            host,
            path,
            base,
        })
    }

    /// Scheme inherited by scheme-less references.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host (with port, when one was given) inherited by host-less references.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Directory path prefixed to relative references. Never ends in `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The directory form of the context, e.g. `http://a.com/dir/`.
    #[must_use]
    pub fn directory(&self) -> &str {
        self.base.as_str()
    }

    /// Resolve `candidate` to an absolute URL.
    ///
    /// Absolute references keep their own scheme and host, `//host/x` inherits
    /// the scheme, `/x` inherits scheme and host, and `x` additionally inherits
    /// the directory. Query strings survive, fragments are dropped. Empty,
    /// fragment-only and opaque (`data:`, `javascript:`) references come back
    /// unchanged, as does anything the URL parser rejects.
    #[must_use]
    pub fn resolve(&self, candidate: &str) -> String {
        let candidate = candidate.trim();
        if candidate.is_empty() || candidate.starts_with('#') || is_opaque(candidate) {
            return candidate.to_string();
        }

        match self.base.join(candidate) {
            Ok(mut resolved) => {
                resolved.set_fragment(None);
                resolved.to_string()
            },
            Err(err) => {
                debug!(%candidate, base = %self.base, error = %err, "reference left unresolved");
                candidate.to_string()
            },
        }
    }
}

fn is_opaque(candidate: &str) -> bool {
    let lower = candidate.get(..11).unwrap_or(candidate).to_ascii_lowercase();
    OPAQUE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Stateful resolver following the `resolve(candidate, base, reset)` contract.
///
/// The context lives in this value, not in process-wide state: create one
/// resolver per extraction request. Pass `reset = true` on the first resolution
/// for every new base document.
#[derive(Debug, Clone, Default)]
pub struct UrlResolver {
    context: Option<UrlContext>,
}

impl UrlResolver {
    /// Create a resolver with no established context.
    #[must_use]
    pub const fn new() -> Self {
        Self { context: None }
    }

    /// Resolve `candidate`, (re)establishing the context from `base` when
    /// `reset` is set or no context exists yet.
    ///
    /// Without a usable base the candidate is returned unchanged.
    pub fn resolve(&mut self, candidate: &str, base: &str, reset: bool) -> String {
        if reset || self.context.is_none() {
            self.context = UrlContext::from_base(base);
        }

        match &self.context {
            Some(context) => context.resolve(candidate),
            None => candidate.to_string(),
        }
    }

    /// The currently established context, if any.
    #[must_use]
    pub const fn context(&self) -> Option<&UrlContext> {
        self.context.as_ref()
    }
}
