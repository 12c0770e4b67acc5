//! Owned CSS rule tree with a tolerant parser and a stable serializer.
//!
//! Parsing never fails. `cssparser` tokenizes the text and recovers from
//! invalid rules like a browser does: a broken rule is skipped, an
//! unterminated block is closed at end of input, and the legacy `<!--`/`-->`
//! markers are ignored. Selector and value text is kept as written, escapes
//! included, so a broken stylesheet still yields every rule that can be
//! recognised.
//!
//! Serialization writes one declaration per line with the last declaration
//! left unterminated:
//!
//! ```rust
//! use pagesplit_core::CssDocument;
//!
//! let doc = CssDocument::parse("a,b.c{color:red;margin:0}");
//! assert_eq!(doc.to_string(), "a, b.c {\n\tcolor: red;\n\tmargin: 0\n}\n");
//! ```

use std::fmt;

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser, Token,
};

/// Selector descriptor of a rule.
///
/// `kind` is `None` for plain style rules and holds the at-keyword
/// (`@media`, `@import`) otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    /// At-rule keyword including the `@`, lowercased.
    pub kind: Option<String>,
    /// Comma-separated parts of the prelude, in source order.
    pub selectors: Vec<String>,
}

impl Selector {
    /// Selector of a plain style rule.
    #[must_use]
    pub fn plain(selectors: Vec<String>) -> Self {
        Self {
            kind: None,
            selectors,
        }
    }

    /// Selector of an at-rule.
    #[must_use]
    pub fn at_rule(kind: impl Into<String>, selectors: Vec<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            selectors,
        }
    }

    /// True when the rule is an at-rule of the given keyword.
    #[must_use]
    pub fn is(&self, keyword: &str) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|kind| kind.eq_ignore_ascii_case(keyword))
    }

}
impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = self.selectors.join(", ");
        match (&self.kind, list.is_empty()) {
            (Some(kind), true) => f.write_str(kind),
            (Some(kind), false) => write!(f, "{kind} {list}"),
            (None, _) => f.write_str(&list),
        }
    }
}

/// A single `name: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name as written.
    pub name: String,
    /// Raw value, trimmed.
    pub value: String,
}

impl Declaration {
    /// Build a declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One rule of the tree: a style rule, a block at-rule, or a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    /// Selector descriptor.
    pub selector: Selector,
    /// Declaration block, in source order.
    pub declarations: Vec<Declaration>,
    /// Nested rules (contents of `@media`, `@supports`, ...).
    pub children: Vec<CssRule>,
    /// `false` for `;`-terminated statements such as `@import` and `@charset`.
    pub block: bool,
}

impl CssRule {
    /// A plain style rule.
    #[must_use]
    pub fn style(selectors: Vec<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            selector: Selector::plain(selectors),
            declarations,
            children: Vec::new(),
            block: true,
        }
    }

    /// An `@media` block wrapping `children`.
    #[must_use]
    pub fn media(query: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            selector: Selector::at_rule("@media", vec![query.into()]),
            declarations: Vec::new(),
            children,
            block: true,
        }
    }

    fn write_to(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "\t".repeat(depth);
        if !self.block {
            return writeln!(f, "{indent}{};", self.selector);
        }

        writeln!(f, "{indent}{} {{", self.selector)?;
        let inner = "\t".repeat(depth + 1);
        let last = self.declarations.len().saturating_sub(1);
        for (idx, decl) in self.declarations.iter().enumerate() {
            let terminator = if idx < last || !self.children.is_empty() {
                ";"
            } else {
                ""
            };
            writeln!(f, "{inner}{}: {}{terminator}", decl.name, decl.value)?;
        }
        for child in &self.children {
            child.write_to(f, depth + 1)?;
        }
        writeln!(f, "{indent}}}")
    }
}

/// What a tree walk does after visiting a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Continue into the rule's children.
    Descend,
    /// Leave the rule's children untouched.
    SkipChildren,
}

/// A parsed stylesheet. Owns its rules; nothing is shared between documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CssDocument {
    rules: Vec<CssRule>,
}

impl CssDocument {
    /// Parse `text` into a rule tree. Never fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);
        let mut rule_parser = TreeParser {
            declarations: false,
        };
        let rules = StyleSheetParser::new(&mut parser, &mut rule_parser)
            .filter_map(|item| match item {
                Ok(Item::Rule(rule)) => Some(rule),
                Ok(Item::Declaration(_)) | Err(_) => None,
            })
            .collect();
        Self { rules }
    }

    /// Build a document from already constructed rules.
    #[must_use]
    pub const fn from_rules(rules: Vec<CssRule>) -> Self {
        Self { rules }
    }

    /// Top-level rules in document order.
    #[must_use]
    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    /// True when the document holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Consume the document, yielding its top-level rules.
    #[must_use]
    pub fn into_rules(self) -> Vec<CssRule> {
        self.rules
    }

    /// Append a top-level rule.
    pub fn push(&mut self, rule: CssRule) {
        self.rules.push(rule);
    }

    /// Detach the top-level rule at `index`. Later rules move up one place.
    pub fn remove(&mut self, index: usize) -> CssRule {
        self.rules.remove(index)
    }

    /// Insert `rules` at `index`, keeping their order.
    pub fn insert_all(&mut self, index: usize, rules: Vec<CssRule>) {
        let index = index.min(self.rules.len());
        self.rules.splice(index..index, rules);
    }

    /// Visit every rule depth-first, parents before children.
    pub fn walk_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut CssRule) -> Visit,
    {
        walk_rules(&mut self.rules, &mut visit);
    }
}

impl fmt::Display for CssDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            rule.write_to(f, 0)?;
        }
        Ok(())
    }
}

fn walk_rules<F>(rules: &mut [CssRule], visit: &mut F)
where
    F: FnMut(&mut CssRule) -> Visit,
{
    for rule in rules {
        if visit(rule) == Visit::Descend {
            walk_rules(&mut rule.children, visit);
        }
    }
}

/// Items of a block body: nested rules and declarations.
enum Item {
    Rule(CssRule),
    Declaration(Declaration),
}

/// Builds the owned tree from `cssparser`'s error-recovering rule parsers.
///
/// Rules and declarations that cannot be parsed are skipped the way browsers
/// skip them. Prelude and value text of the rest is kept as written, with
/// comments removed and whitespace runs collapsed to one space.
struct TreeParser {
    declarations: bool,
}

impl<'i> QualifiedRuleParser<'i> for TreeParser {
    type Prelude = Vec<String>;
    type QualifiedRule = Item;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let selectors = read_parts(input, true);
        if selectors.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(selectors)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let (declarations, children) = parse_body(input, true);
        Ok(Item::Rule(CssRule {
            selector: Selector::plain(prelude),
            declarations,
            children,
            block: true,
        }))
    }
}

impl<'i> AtRuleParser<'i> for TreeParser {
    type Prelude = Selector;
    type AtRule = Item;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let kind = format!("@{}", name.to_ascii_lowercase());
        Ok(Selector::at_rule(kind, read_parts(input, true)))
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        Ok(Item::Rule(CssRule {
            selector: prelude,
            declarations: Vec::new(),
            children: Vec::new(),
            block: false,
        }))
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let (declarations, children) = parse_body(input, !holds_only_rules(&prelude));
        Ok(Item::Rule(CssRule {
            selector: prelude,
            declarations,
            children,
            block: true,
        }))
    }
}

impl<'i> DeclarationParser<'i> for TreeParser {
    type Declaration = Item;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let value = read_parts(input, false).pop().unwrap_or_default();
        Ok(Item::Declaration(Declaration::new(&*name, value)))
    }
}

impl<'i> RuleBodyItemParser<'i, Item, ()> for TreeParser {
    fn parse_declarations(&self) -> bool {
        self.declarations
    }

    fn parse_qualified(&self) -> bool {
        true
    }
}

/// Parse the contents of a block. Group rule bodies (`declarations` false)
/// hold only rules, so `a:hover{...}` there is never read as a declaration.
fn parse_body(input: &mut Parser<'_, '_>, declarations: bool) -> (Vec<Declaration>, Vec<CssRule>) {
    let mut parser = TreeParser { declarations };
    let mut decls = Vec::new();
    let mut rules = Vec::new();
    for item in RuleBodyParser::new(input, &mut parser).flatten() {
        match item {
            Item::Rule(rule) => rules.push(rule),
            Item::Declaration(decl) => decls.push(decl),
        }
    }
    (decls, rules)
}

/// At-rules whose block is a list of rules rather than declarations,
/// including vendor-prefixed forms such as `@-webkit-keyframes`.
fn holds_only_rules(selector: &Selector) -> bool {
    let Some(name) = selector.kind.as_deref().map(|kind| kind.trim_start_matches('@')) else {
        return false;
    };
    let name = name
        .strip_prefix('-')
        .and_then(|vendored| vendored.split_once('-'))
        .map_or(name, |(_, bare)| bare);
    matches!(
        name,
        "media"
            | "supports"
            | "document"
            | "layer"
            | "container"
            | "scope"
            | "starting-style"
            | "keyframes"
    )
}

/// Source text of the remaining tokens of `input`.
///
/// Comments are dropped, whitespace between tokens collapses to one space,
/// and nested blocks are copied verbatim. With `split`, the text is cut at
/// top-level commas; empty parts are dropped either way. A stray `}` discards
/// everything read before it.
fn read_parts<'i>(input: &mut Parser<'i, '_>, split: bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Comment(_) => {},
            Token::WhiteSpace(_) => {
                if !current.is_empty() && !current.ends_with(' ') {
                    current.push(' ');
                }
            },
            Token::Comma if split => parts.push(std::mem::take(&mut current)),
            Token::CloseCurlyBracket => {
                parts.clear();
                current.clear();
            },
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let _ = input.parse_nested_block(|nested| {
                    while nested.next_including_whitespace_and_comments().is_ok() {}
                    Ok::<(), ParseError<'i, ()>>(())
                });
                current.push_str(input.slice_from(start));
            },
            _ => current.push_str(input.slice_from(start)),
        }
    }

    parts.push(current);
    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
