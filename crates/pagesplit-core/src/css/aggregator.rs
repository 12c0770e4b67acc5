//! Stylesheet loading with recursive `@import` inlining.
//!
//! Each stylesheet is parsed, has its `url(...)` references rebased against its
//! own directory, and then has its top-level imports replaced in place by the
//! rules of the imported stylesheets. Imports are followed depth-first, one
//! fetch at a time, in document order, so later stages always see a flat tree.

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::css::{CssDocument, CssRule, rebase_urls};
use crate::{Diagnostic, PageFetch, UrlContext};

/// Default bound on nested `@import` chains.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 8;

/// Loads stylesheets and flattens their import chains.
pub struct CssAggregator<'a> {
    fetcher: &'a dyn PageFetch,
    max_depth: usize,
}

impl<'a> CssAggregator<'a> {
    /// Aggregator fetching through `fetcher` with the default depth limit.
    #[must_use]
    pub fn new(fetcher: &'a dyn PageFetch) -> Self {
        Self {
            fetcher,
            max_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }

    /// Override the import depth limit. Imports nested deeper are dropped,
    /// which also ends import cycles.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Fetch and aggregate the stylesheet at `url`.
    ///
    /// Returns `None` when the stylesheet is unavailable.
    pub async fn load(&self, url: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<CssDocument> {
        let document = self.load_at(url, 0, diagnostics).await;
        if document.is_none() {
            warn!(%url, "stylesheet unavailable");
            diagnostics.push(Diagnostic::FetchUnavailable {
                url: url.to_string(),
            });
        }
        document
    }

    /// Aggregate stylesheet text that was found at (or inside) `source_url`.
    pub async fn from_text(
        &self,
        text: &str,
        source_url: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> CssDocument {
        self.build(text, source_url, 0, diagnostics).await
    }

    fn load_at<'b>(
        &'b self,
        url: &'b str,
        depth: usize,
        diagnostics: &'b mut Vec<Diagnostic>,
    ) -> BoxFuture<'b, Option<CssDocument>> {
        async move {
            debug!(%url, depth, "loading stylesheet");
            let text = self.fetcher.fetch_text(url).await?;
            Some(self.build(&text, url, depth, diagnostics).await)
        }
        .boxed()
    }

    async fn build(
        &self,
        text: &str,
        source_url: &str,
        depth: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> CssDocument {
        let mut document = CssDocument::parse(text);
        let context = UrlContext::from_base(source_url);
        if let Some(context) = &context {
            rebase_urls(&mut document, context);
        }
        self.inline_imports(&mut document, context.as_ref(), source_url, depth, diagnostics)
            .await;
        document
    }

    async fn inline_imports(
        &self,
        document: &mut CssDocument,
        context: Option<&UrlContext>,
        source_url: &str,
        depth: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let mut index = 0;
        while index < document.rules().len() {
            if !document.rules()[index].selector.is("@import") {
                index += 1;
                continue;
            }
            let rule = document.remove(index);
            let Some(import) = ImportTarget::of(&rule) else {
                debug!(stylesheet = %source_url, "dropping @import without a target");
                continue;
            };

            let target = context.map_or_else(|| import.href.clone(), |ctx| ctx.resolve(&import.href));
            if depth >= self.max_depth {
                warn!(url = %target, depth, "import depth limit reached");
                diagnostics.push(Diagnostic::ImportDepthExceeded { url: target });
                continue;
            }

            match self.load_at(&target, depth + 1, diagnostics).await {
                Some(imported) if !imported.is_empty() => {
                    let rules = match import.media {
                        Some(query) => vec![CssRule::media(query, imported.into_rules())],
                        None => imported.into_rules(),
                    };
                    let count = rules.len();
                    document.insert_all(index, rules);
                    index += count;
                },
                Some(_) => debug!(url = %target, "imported stylesheet is empty"),
                None => {
                    warn!(url = %target, stylesheet = %source_url, "dropping unresolvable @import");
                    diagnostics.push(Diagnostic::ImportUnresolvable {
                        target,
                        stylesheet: source_url.to_string(),
                    });
                },
            }
        }
    }
}

/// Target and optional media query of an `@import` rule.
#[derive(Debug, PartialEq, Eq)]
struct ImportTarget {
    href: String,
    media: Option<String>,
}

impl ImportTarget {
    /// `None` when the rule names no target, as in `@import url();`.
    fn of(rule: &CssRule) -> Option<Self> {
        Self::parse(&rule.selector.selectors.join(", "))
    }

    /// Split `url("a.css") screen` into its target and media query.
    fn parse(prelude: &str) -> Option<Self> {
        let prelude = prelude.trim();
        let (href, rest) = if prelude.get(..4).is_some_and(|head| head.eq_ignore_ascii_case("url(")) {
            let close = prelude.find(')')?;
            (unquote(&prelude[4..close]), &prelude[close + 1..])
        } else if let Some(quote) = prelude.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let body = &prelude[1..];
            let close = body.find(quote).unwrap_or(body.len());
            (body[..close].to_string(), body.get(close + 1..).unwrap_or(""))
        } else {
            let end = prelude.find(char::is_whitespace).unwrap_or(prelude.len());
            (prelude[..end].to_string(), &prelude[end..])
        };

        let href = href.trim().to_string();
        if href.is_empty() {
            return None;
        }
        let media = Some(rest.trim())
            .filter(|media| !media.is_empty())
            .map(str::to_string);
        Some(Self { href, media })
    }
}

fn unquote(text: &str) -> String {
    text.trim().trim_matches(|c| c == '"' || c == '\'').to_string()
}
