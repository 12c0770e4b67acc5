//! Page decomposition into body HTML, one prefixed stylesheet, and script URLs.
//!
//! The page is treated as flat text. A fixed sequence of strip-and-collect
//! passes runs over it, each feeding the next:
//!
//! 1. external scripts are collected and removed
//! 2. remaining inline scripts are removed
//! 3. stylesheet links are loaded, aggregated, prefixed and removed
//! 4. inline `<style>` blocks are aggregated, prefixed and removed
//! 5. the text is narrowed to the inner `<body>` when there is one
//! 6. CSS and HTML are compressed independently
//!
//! Every pass tolerates zero matches and every fetch may fail; the result is
//! always produced, possibly partially empty.

use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::compress::{compress_css, compress_html};
use crate::css::{CssAggregator, DEFAULT_MAX_IMPORT_DEPTH, add_prefix};
use crate::{Diagnostic, PageExtraction, PageFetch, SplitReport, UrlResolver};

/// `<script>` tags carrying a `src` attribute, with their (markup-free) body
/// and closing tag when present.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static EXTERNAL_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*\bsrc\s*=[^>]*>(?:[^<]*</script>)?").unwrap()
});

/// Any remaining `<script>...</script>` block.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static INLINE_SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());

/// `<link>` tags mentioning `stylesheet`.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static STYLESHEET_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<link\b[^>]*\bstylesheet\b[^>]*>").unwrap());

/// `<style>` blocks, capturing their text.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static STYLE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>(.*?)</style>").unwrap());

/// Inner content of `<body>`, up to the last `</body>`.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body>").unwrap());

/// `src=` attribute value, quoted or bare.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static SRC_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

/// `href=` attribute value, quoted or bare.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\shref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

/// Splits pages fetched through a [`PageFetch`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use pagesplit_core::{Fetcher, PageSplitter};
///
/// # async fn run() -> pagesplit_core::Result<()> {
/// let splitter = PageSplitter::new(Arc::new(Fetcher::new()?));
/// let page = splitter.split("https://example.com/", "#embed").await;
/// println!("{} scripts, {} bytes of css", page.scripts.len(), page.css.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PageSplitter {
    fetcher: Arc<dyn PageFetch>,
    max_import_depth: usize,
}

impl PageSplitter {
    /// Splitter using `fetcher` for the page, its stylesheets and imports.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetch>) -> Self {
        Self {
            fetcher,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }

    /// Override the `@import` depth limit.
    #[must_use]
    pub const fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    /// Fetch and split the page at `url`, scoping its CSS under `prefix`.
    pub async fn split(&self, url: &str, prefix: &str) -> PageExtraction {
        self.split_with_diagnostics(url, prefix).await.extraction
    }

    /// Like [`split`](Self::split), also reporting what was dropped.
    pub async fn split_with_diagnostics(&self, url: &str, prefix: &str) -> SplitReport {
        let Some(html) = self.fetcher.fetch_text(url).await else {
            warn!(%url, "page unavailable");
            return SplitReport {
                extraction: PageExtraction::default(),
                diagnostics: vec![Diagnostic::FetchUnavailable {
                    url: url.to_string(),
                }],
                page_fetched: false,
            };
        };
        self.split_html(&html, url, prefix).await
    }

    /// Split already fetched page markup. `url` is where the page lives and
    /// serves as the base for its relative references.
    pub async fn split_html(&self, html: &str, url: &str, prefix: &str) -> SplitReport {
        let mut diagnostics = Vec::new();
        let mut resolver = UrlResolver::new();
        let aggregator =
            CssAggregator::new(self.fetcher.as_ref()).with_max_depth(self.max_import_depth);

        let mut scripts = Vec::new();
        for tag in EXTERNAL_SCRIPT_RE.find_iter(html) {
            if let Some(src) = attribute(&SRC_ATTR_RE, opening_tag(tag.as_str())) {
                scripts.push(resolver.resolve(&src, url, true));
            }
        }
        let text = EXTERNAL_SCRIPT_RE.replace_all(html, "");
        let text = INLINE_SCRIPT_RE.replace_all(&text, "");

        let hrefs: Vec<String> = STYLESHEET_LINK_RE
            .find_iter(&text)
            .filter_map(|tag| attribute(&HREF_ATTR_RE, tag.as_str()))
            .collect();
        let text = STYLESHEET_LINK_RE.replace_all(&text, "").into_owned();

        let mut css = String::new();
        for href in hrefs {
            let css_url = resolver.resolve(&href, url, true);
            if let Some(mut document) = aggregator.load(&css_url, &mut diagnostics).await {
                add_prefix(&mut document, prefix);
                css.push_str(&document.to_string());
            }
        }

        let blocks: Vec<String> = STYLE_BLOCK_RE
            .captures_iter(&text)
            .map(|caps| caps[1].to_string())
            .collect();
        let text = STYLE_BLOCK_RE.replace_all(&text, "");
        for block in blocks {
            let mut document = aggregator.from_text(&block, url, &mut diagnostics).await;
            add_prefix(&mut document, prefix);
            css.push_str(&document.to_string());
        }

        let body = BODY_RE.captures(&text).map(|caps| caps[1].to_string());
        let body = match body {
            Some(body) => body,
            None => {
                debug!(%url, "no <body> element, keeping the whole document");
                diagnostics.push(Diagnostic::BodyNotFound);
                text.into_owned()
            },
        };

        let extraction = PageExtraction {
            html: compress_html(&body),
            css: compress_css(&css),
            scripts,
        };
        info!(
            %url,
            html_bytes = extraction.html.len(),
            css_bytes = extraction.css.len(),
            scripts = extraction.scripts.len(),
            diagnostics = diagnostics.len(),
            "split page"
        );
        SplitReport {
            extraction,
            diagnostics,
            page_fetched: true,
        }
    }
}

/// The tag up to and including its first `>`.
fn opening_tag(tag: &str) -> &str {
    tag.find('>').map_or(tag, |end| &tag[..=end])
}

/// First non-empty value of the attribute matched by `re` inside `tag`.
fn attribute(re: &Regex, tag: &str) -> Option<String> {
    re.captures_iter(tag)
        .filter_map(|caps: Captures<'_>| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim().to_string())
        })
        .find(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::MapFetch;
    use pretty_assertions::assert_eq;

    const PAGE_URL: &str = "http://x.com/p.html";

    fn splitter(fetch: MapFetch) -> PageSplitter {
        PageSplitter::new(Arc::new(fetch))
    }

    #[tokio::test]
    async fn test_end_to_end_minimal_page() {
        // Given: A page with an inline style, an external script and text
        let fetch = MapFetch::new([(
            PAGE_URL,
            r#"<html><body><style>.x{color:red}</style><script src="a.js"></script>Hello</body></html>"#,
        )]);

        // When: Splitting it under a prefix
        let page = splitter(fetch).split(PAGE_URL, "#w").await;

        // Then: Each part lands in its own field
        assert!(page.html.contains("Hello"));
        assert!(!page.html.contains("<script"));
        assert!(!page.html.contains("<style"));
        assert_eq!(page.css, compress_css("#w .x{color:red}"));
        assert_eq!(page.css, "#w .x{color:red}");
        assert_eq!(page.scripts, vec!["http://x.com/a.js"]);
    }

    #[tokio::test]
    async fn test_scripts_collected_in_document_order() {
        let html = r#"<head>
            <script type="text/javascript" src="/lib/jquery.js"></script>
            <SCRIPT SRC='app.js'></SCRIPT>
            <script src=https://cdn.com/x.js />
            <script>var inline = 1;</script>
            <script data-src="lazy.js" src="real.js"></script>
        </head><body><p>Hi</p></body>"#;
        let report = splitter(MapFetch::default())
            .split_html(html, "http://a.com/docs/page.html", "")
            .await;

        assert_eq!(
            report.extraction.scripts,
            vec![
                "http://a.com/lib/jquery.js",
                "http://a.com/docs/app.js",
                "https://cdn.com/x.js",
                "http://a.com/docs/real.js",
            ]
        );
        assert_eq!(report.extraction.html, "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_inline_scripts_removed_across_lines() {
        let html = "<body>a<script>\nif (x < 1) {\n  go();\n}\n</script>b<script type=\"module\">m()</script>c</body>";
        let report = splitter(MapFetch::default()).split_html(html, PAGE_URL, "").await;
        assert_eq!(report.extraction.html, "abc");
        assert!(report.extraction.scripts.is_empty());
    }

    #[tokio::test]
    async fn test_linked_stylesheets_then_inline_styles() {
        // Given: A linked stylesheet that imports another, plus an inline block
        let fetch = MapFetch::new([
            ("http://a.com/css/site.css", "@import url(\"base.css\");\n.site { color: red }"),
            ("http://a.com/css/base.css", "body { margin: 0 }"),
        ]);
        let html = r#"<html><head>
            <link rel="stylesheet" href="css/site.css">
            <link rel="icon" href="favicon.ico">
            <style>.inline { top: 0 }</style>
        </head><body>X</body></html>"#;

        // When: Splitting under a prefix
        let report = splitter(fetch).split_html(html, "http://a.com/index.html", "#p").await;

        // Then: Linked CSS (imports first) precedes inline CSS, all prefixed
        assert_eq!(
            report.extraction.css,
            "#p body{margin:0}#p .site{color:red}#p .inline{top:0}"
        );
        assert_eq!(report.extraction.html, "X");
        assert!(report.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_stylesheet_contributes_nothing() {
        let html = r#"<link href="gone.css" rel="stylesheet"/><body><style>a{b:c}</style>ok</body>"#;
        let report = splitter(MapFetch::default()).split_html(html, PAGE_URL, "").await;

        assert_eq!(report.extraction.css, "a{b:c}");
        assert_eq!(report.extraction.html, "ok");
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::FetchUnavailable {
                url: "http://x.com/gone.css".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_body_keeps_whole_document() {
        let html = "<div>\n    <p>Fragment</p>\n</div>";
        let report = splitter(MapFetch::default()).split_html(html, PAGE_URL, "").await;

        assert_eq!(report.extraction.html, "<div><p>Fragment</p></div>");
        assert_eq!(report.diagnostics, vec![Diagnostic::BodyNotFound]);
    }

    #[tokio::test]
    async fn test_unavailable_page_yields_empty_extraction() {
        let fetch = MapFetch::default();
        let report = splitter(fetch).split_with_diagnostics(PAGE_URL, "#w").await;

        assert!(!report.page_fetched);
        assert!(report.extraction.is_empty());
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::FetchUnavailable {
                url: PAGE_URL.into()
            }]
        );
    }

    #[tokio::test]
    async fn test_inline_style_imports_resolve_against_page_directory() {
        let fetch = MapFetch::new([("http://a.com/docs/theme.css", ".t { x: 1 }")]);
        let html = "<body><style>@import 'theme.css'; .own { y: 2 }</style></body>";

        let report = splitter(fetch)
            .split_html(html, "http://a.com/docs/page.html", "")
            .await;

        assert_eq!(report.extraction.css, ".t{x:1}.own{y:2}");
    }

    #[tokio::test]
    async fn test_split_is_deterministic() {
        let pages = [
            (PAGE_URL, "<body><link rel=stylesheet href=s.css><style>p{a:b}</style>T</body>"),
            ("http://x.com/s.css", "@media print { p { c: d } }"),
        ];
        let first = splitter(MapFetch::new(pages)).split(PAGE_URL, ".w").await;
        let second = splitter(MapFetch::new(pages)).split(PAGE_URL, ".w").await;

        assert_eq!(first, second);
        assert_eq!(first.css, "@media print{.w p{c:d}}.w p{a:b}");
    }

    #[test]
    fn test_attribute_extraction() {
        assert_eq!(
            attribute(&HREF_ATTR_RE, r#"<link rel="stylesheet" href="a.css">"#).as_deref(),
            Some("a.css")
        );
        assert_eq!(
            attribute(&HREF_ATTR_RE, "<link rel=stylesheet href=b.css>").as_deref(),
            Some("b.css")
        );
        assert_eq!(attribute(&HREF_ATTR_RE, r#"<link rel="stylesheet" href="">"#), None);
        assert_eq!(attribute(&SRC_ATTR_RE, r#"<script data-src="x.js">"#), None);
    }
}
