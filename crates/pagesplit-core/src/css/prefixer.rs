//! Selector scoping: every plain selector gets a namespace prefix so the
//! stylesheet only applies inside the embedding element.

use crate::css::{CssDocument, CssRule, Visit};

/// Prepend `prefix` and a space to every plain selector in `document`.
///
/// At-rules are never prefixed themselves, but the plain rules nested in
/// them are, at any depth. Keyframe blocks are skipped because their
/// children (`from`, `50%`) are offsets, not element selectors. An empty
/// prefix leaves the document untouched.
///
/// ```rust
/// use pagesplit_core::{CssDocument, css::add_prefix};
///
/// let mut doc = CssDocument::parse("a, b.c { color: red }");
/// add_prefix(&mut doc, "#widget");
/// assert_eq!(doc.rules()[0].selector.selectors, vec!["#widget a", "#widget b.c"]);
/// ```
pub fn add_prefix(document: &mut CssDocument, prefix: &str) {
    if prefix.is_empty() {
        return;
    }

    document.walk_mut(|rule| {
        if is_keyframes(rule) {
            return Visit::SkipChildren;
        }
        if rule.selector.kind.is_none() {
            for selector in &mut rule.selector.selectors {
                if !selector.is_empty() {
                    *selector = format!("{prefix} {selector}");
                }
            }
        }
        Visit::Descend
    });
}

fn is_keyframes(rule: &CssRule) -> bool {
    rule.selector
        .kind
        .as_deref()
        .is_some_and(|kind| kind.ends_with("keyframes"))
}
