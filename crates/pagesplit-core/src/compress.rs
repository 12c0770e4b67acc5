//! Textual whitespace and comment stripping for CSS and HTML.
//!
//! Both functions are fixed sequences of substitutions rather than
//! grammar-aware minifiers, and their output is relied on byte for byte.
//! Whitespace inside `<pre>` blocks is not protected.

use std::sync::LazyLock;

use regex::Regex;

/// CSS comment, non-greedy across lines.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static CSS_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*[^*]*\*+(?:[^/][^*]*\*+)*/").unwrap());

/// Runs of two or more spaces.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static HTML_SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

/// HTML comments, tabs, and line breaks with their leading indentation.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static HTML_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|\t|(?:\r?\n[ \t]*)+").unwrap());

/// Removed from CSS in this order. Four-space runs are already gone once
/// double spaces are stripped.
const CSS_STRIPPED: [&str; 5] = ["\r\n", "\r", "\n", "\t", "  "];

/// Strip comments and layout whitespace from CSS.
///
/// Comments go first, so a comment opener split by a line break (`/\n*`)
/// only becomes a comment after the first pass: `x{/\n* y */}` compresses to
/// `x{/* y */}` and then to `x{}`.
///
/// ```rust
/// use pagesplit_core::compress::compress_css;
///
/// assert_eq!(compress_css("a {\n\tcolor: red\n}\n/* x */"), "a{color:red}");
/// ```
#[must_use]
pub fn compress_css(css: &str) -> String {
    let mut out = CSS_COMMENT_RE.replace_all(css, "").into_owned();
    for pattern in CSS_STRIPPED {
        out = out.replace(pattern, "");
    }
    out.replace(" {", "{").replace(": ", ":")
}

/// Collapse space runs, then drop comments, tabs, and line breaks with their
/// indentation.
///
/// Spaces are collapsed before tabs are removed, so a tab between spaces
/// leaves a double space behind: `a \t b` compresses to `a  b` and only a
/// second pass yields `a b`. Text inside `<pre>` is not protected either.
///
/// ```rust
/// use pagesplit_core::compress::compress_html;
///
/// assert_eq!(compress_html("<p>a    b</p>\n    <!-- c -->\n<p>d</p>"), "<p>a b</p><p>d</p>");
/// ```
#[must_use]
pub fn compress_html(html: &str) -> String {
    let collapsed = HTML_SPACES_RE.replace_all(html, " ");
    HTML_NOISE_RE.replace_all(&collapsed, "").into_owned()
}
