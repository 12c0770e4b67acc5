//! Rewrite `url(...)` references in declarations to absolute URLs.
//!
//! A stylesheet lifted out of its page loses the directory its relative
//! references pointed into, so images and fonts are rebased against the
//! directory of the stylesheet that declared them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::UrlContext;
use crate::css::{CssDocument, Visit};

/// `url(...)` with a double-quoted, single-quoted, or bare target.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static URL_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))\s*\)"#).unwrap()
});

/// Rebase every `url(...)` in `document` against `context`.
///
/// `data:` URIs and fragment-only references are left alone.
pub fn rebase_urls(document: &mut CssDocument, context: &UrlContext) {
    document.walk_mut(|rule| {
        for decl in &mut rule.declarations {
            if let Some(rebased) = rebase_value(&decl.value, context) {
                decl.value = rebased;
            }
        }
        Visit::Descend
    });
}

/// Returns `None` when nothing in `value` changed.
fn rebase_value(value: &str, context: &UrlContext) -> Option<String> {
    if !URL_REF_RE.is_match(value) {
        return None;
    }

    let replaced = URL_REF_RE.replace_all(value, |caps: &Captures<'_>| {
        let target = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        let resolved = context.resolve(target);
        if target.is_empty() || resolved == target {
            caps[0].to_string()
        } else {
            format!("url(\"{resolved}\")")
        }
    });

    (replaced != value).then(|| replaced.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn context() -> UrlContext {
        UrlContext::from_base("http://a.com/assets/css/site.css").unwrap()
    }

    #[test]
    fn test_relative_references_become_absolute() {
        let mut doc = CssDocument::parse(
            ".a { background: url(../img/bg.png) no-repeat } \
             .b { background-image: url('x.png') } \
             .c { cursor: url(\"/cur.cur\"), auto }",
        );

        rebase_urls(&mut doc, &context());

        let values: Vec<_> = doc
            .rules()
            .iter()
            .map(|r| r.declarations[0].value.clone())
            .collect();
        assert_eq!(
            values,
            vec![
                "url(\"http://a.com/assets/img/bg.png\") no-repeat",
                "url(\"http://a.com/assets/css/x.png\")",
                "url(\"http://a.com/cur.cur\"), auto",
            ]
        );
    }

    #[test]
    fn test_data_uris_and_absolute_urls_untouched() {
        let mut doc = CssDocument::parse(
            ".a { background: url(data:image/png;base64,AA==) } .b { background: url(http://cdn.com/x.png) }",
        );
        let before = doc.clone();
        rebase_urls(&mut doc, &context());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_nested_font_face_sources_rebased() {
        let mut doc = CssDocument::parse(
            "@media screen { @font-face { font-family: F; src: url(f.woff2) format(\"woff2\") } }",
        );
        rebase_urls(&mut doc, &context());
        let font_face = &doc.rules()[0].children[0];
        assert_eq!(
            font_face.declarations[1].value,
            "url(\"http://a.com/assets/css/f.woff2\") format(\"woff2\")"
        );
    }
}
