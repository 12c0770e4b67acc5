//! CSS handling: the rule tree, `@import` aggregation, selector prefixing,
//! and `url(...)` rebasing.

mod aggregator;
mod prefixer;
mod rebase;
mod tree;

pub use aggregator::{CssAggregator, DEFAULT_MAX_IMPORT_DEPTH};
pub use prefixer::add_prefix;
pub use rebase::rebase_urls;
pub use tree::{CssDocument, CssRule, Declaration, Selector, Visit};
