//! Declarative grammar definitions
//!
//! A [`Language`] is a root [`Mode`] plus naming and detection metadata.
//! Modes form a tree through `contains`, `variants` and `starts`. Shared
//! modes are plain `Rc<Mode>` values; the compiler memoises per `Rc`
//! identity, so sharing one mode in several places compiles it once.
//!
//! Recursion is expressed without ownership cycles:
//! - [`ModeRef::SelfRef`] lets a mode contain itself
//! - [`LateMode`] is a slot filled after construction, for mutually
//!   recursive modes (e.g. an interpolation inside a string inside an
//!   interpolation)
//!
//! Grammars can be built in code with the builder methods or loaded from
//! JSON, where `"self"` inside `contains` is the self-reference marker.

pub mod helpers;
mod keywords;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use once_cell::unsync::OnceCell;
use serde::Deserialize;

pub use crate::compiler::matcher::RuleMatch;
use crate::error::{HighlightError, Result};
pub(crate) use keywords::{KeywordEntry, KeywordTable};
pub use keywords::{Keywords, COMMON_KEYWORDS, DEFAULT_KEYWORD_CATEGORY};

/// Outcome of a guard callback run on a candidate begin/end match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    Accept,
    /// Treat the match as ordinary text instead
    Reject,
}

/// Scratch storage a guard callback can use to pass state from the begin
/// match of a mode to its end match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeData {
    values: HashMap<String, String>,
}

impl ModeData {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

type GuardFn = dyn Fn(&RuleMatch, &mut ModeData) -> MatchDecision + Send + Sync;

/// Caller-supplied callback that may veto a begin or end match
#[derive(Clone)]
pub struct MatchGuard(Arc<GuardFn>);

impl MatchGuard {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RuleMatch, &mut ModeData) -> MatchDecision + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn check(&self, m: &RuleMatch, data: &mut ModeData) -> MatchDecision {
        (self.0)(m, data)
    }
}

impl fmt::Debug for MatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MatchGuard(..)")
    }
}

/// One or several patterns that must never match inside a mode
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Illegal {
    One(String),
    Any(Vec<String>),
}

/// Grammar(s) a mode delegates its content to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubLanguage {
    /// One named grammar
    Named(String),
    /// Auto-detect among these grammars (all registered ones when empty)
    Detect(Vec<String>),
}

/// A slot for a mode that is defined after the modes referring to it
#[derive(Clone, Default)]
pub struct LateMode(Rc<OnceCell<Rc<Mode>>>);

impl LateMode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the slot. Returns false if it was already filled.
    pub fn set(&self, mode: impl Into<Rc<Mode>>) -> bool {
        self.0.set(mode.into()).is_ok()
    }

    pub fn get(&self) -> Option<&Rc<Mode>> {
        self.0.get()
    }
}

impl fmt::Debug for LateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LateMode")
            .field("set", &self.0.get().is_some())
            .finish()
    }
}

/// An entry of a mode's `contains` list
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawModeRef")]
pub enum ModeRef {
    /// The mode containing this entry
    SelfRef,
    Mode(Rc<Mode>),
    Late(LateMode),
}

impl ModeRef {
    pub fn is_self(&self) -> bool {
        matches!(self, ModeRef::SelfRef)
    }
}

impl From<Mode> for ModeRef {
    fn from(mode: Mode) -> Self {
        ModeRef::Mode(Rc::new(mode))
    }
}

impl From<Rc<Mode>> for ModeRef {
    fn from(mode: Rc<Mode>) -> Self {
        ModeRef::Mode(mode)
    }
}

impl From<&Rc<Mode>> for ModeRef {
    fn from(mode: &Rc<Mode>) -> Self {
        ModeRef::Mode(Rc::clone(mode))
    }
}

impl From<&LateMode> for ModeRef {
    fn from(slot: &LateMode) -> Self {
        ModeRef::Late(slot.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawModeRef {
    Marker(String),
    Mode(Box<Mode>),
}

impl TryFrom<RawModeRef> for ModeRef {
    type Error = String;

    fn try_from(raw: RawModeRef) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawModeRef::Marker(marker) if marker == "self" => Ok(ModeRef::SelfRef),
            RawModeRef::Marker(other) => Err(format!(
                "unknown mode reference `{}` (only \"self\" is supported)",
                other
            )),
            RawModeRef::Mode(mode) => Ok(ModeRef::Mode(Rc::new(*mode))),
        }
    }
}

/// A lexical rule: how to recognise a span of text and what to call it
///
/// Every attribute is optional so that variants can override exactly the
/// attributes they set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mode {
    pub class_name: Option<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
    /// Shorthand for a `begin` with no `end`
    #[serde(rename = "match")]
    pub match_pattern: Option<String>,
    pub begin_keywords: Option<String>,
    pub keywords: Option<Keywords>,
    /// Legacy spelling of the keyword scan pattern
    pub lexemes: Option<String>,
    pub illegal: Option<Illegal>,
    pub contains: Option<Vec<ModeRef>>,
    pub variants: Option<Vec<Mode>>,
    pub starts: Option<Rc<Mode>>,
    pub relevance: Option<u32>,
    pub ends_with_parent: Option<bool>,
    pub ends_parent: Option<bool>,
    pub end_same_as_begin: Option<bool>,
    pub skip: Option<bool>,
    pub exclude_begin: Option<bool>,
    pub exclude_end: Option<bool>,
    pub return_begin: Option<bool>,
    pub return_end: Option<bool>,
    pub sub_language: Option<SubLanguage>,
    #[serde(skip)]
    pub on_begin: Option<MatchGuard>,
    #[serde(skip)]
    pub on_end: Option<MatchGuard>,
}

macro_rules! flag_setters {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(mut self) -> Self {
                self.$name = Some(true);
                self
            }
        )*
    };
}

impl Mode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn begin(mut self, pattern: impl Into<String>) -> Self {
        self.begin = Some(pattern.into());
        self
    }

    pub fn end(mut self, pattern: impl Into<String>) -> Self {
        self.end = Some(pattern.into());
        self
    }

    /// A single-pattern mode (no end of its own)
    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.match_pattern = Some(pattern.into());
        self
    }

    pub fn begin_keywords(mut self, words: impl Into<String>) -> Self {
        self.begin_keywords = Some(words.into());
        self
    }

    pub fn keywords(mut self, keywords: impl Into<Keywords>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn lexemes(mut self, pattern: impl Into<String>) -> Self {
        self.lexemes = Some(pattern.into());
        self
    }

    pub fn illegal(mut self, pattern: impl Into<String>) -> Self {
        self.illegal = Some(Illegal::One(pattern.into()));
        self
    }

    pub fn illegal_any<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.illegal = Some(Illegal::Any(patterns.into_iter().map(Into::into).collect()));
        self
    }

    /// Replace the list of child modes
    pub fn contains<I, R>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ModeRef>,
    {
        self.contains = Some(children.into_iter().map(Into::into).collect());
        self
    }

    /// Append one child mode
    pub fn contain(mut self, child: impl Into<ModeRef>) -> Self {
        self.contains.get_or_insert_with(Vec::new).push(child.into());
        self
    }

    /// Let this mode nest inside itself
    pub fn contain_self(self) -> Self {
        self.contain(ModeRef::SelfRef)
    }

    pub fn variants<I>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = Mode>,
    {
        self.variants = Some(variants.into_iter().collect());
        self
    }

    /// Mode pushed as soon as this one ends
    pub fn starts(mut self, mode: impl Into<Rc<Mode>>) -> Self {
        self.starts = Some(mode.into());
        self
    }

    pub fn relevance(mut self, relevance: u32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    flag_setters!(
        /// End together with the parent when the parent's end matches
        ends_with_parent,
        /// Close the parent as well when this mode ends
        ends_parent,
        end_same_as_begin,
        /// Matched text stays part of the parent's content
        skip,
        exclude_begin,
        exclude_end,
        return_begin,
        return_end,
    );

    pub fn sub_language(mut self, name: impl Into<String>) -> Self {
        self.sub_language = Some(SubLanguage::Named(name.into()));
        self
    }

    /// Auto-detect the content among these grammars (all when empty)
    pub fn sub_language_any<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_language = Some(SubLanguage::Detect(names.into_iter().map(Into::into).collect()));
        self
    }

    pub fn on_begin<F>(mut self, f: F) -> Self
    where
        F: Fn(&RuleMatch, &mut ModeData) -> MatchDecision + Send + Sync + 'static,
    {
        self.on_begin = Some(MatchGuard::new(f));
        self
    }

    pub fn on_end<F>(mut self, f: F) -> Self
    where
        F: Fn(&RuleMatch, &mut ModeData) -> MatchDecision + Send + Sync + 'static,
    {
        self.on_end = Some(MatchGuard::new(f));
        self
    }

    pub fn into_ref(self) -> Rc<Mode> {
        Rc::new(self)
    }

    /// Copy of `self` with every attribute `overlay` sets taking precedence.
    /// The result carries no variants.
    pub fn merge(&self, overlay: &Mode) -> Mode {
        fn pick<T: Clone>(base: &Option<T>, over: &Option<T>) -> Option<T> {
            over.clone().or_else(|| base.clone())
        }

        Mode {
            class_name: pick(&self.class_name, &overlay.class_name),
            begin: pick(&self.begin, &overlay.begin),
            end: pick(&self.end, &overlay.end),
            match_pattern: pick(&self.match_pattern, &overlay.match_pattern),
            begin_keywords: pick(&self.begin_keywords, &overlay.begin_keywords),
            keywords: pick(&self.keywords, &overlay.keywords),
            lexemes: pick(&self.lexemes, &overlay.lexemes),
            illegal: pick(&self.illegal, &overlay.illegal),
            contains: pick(&self.contains, &overlay.contains),
            variants: None,
            starts: pick(&self.starts, &overlay.starts),
            relevance: pick(&self.relevance, &overlay.relevance),
            ends_with_parent: pick(&self.ends_with_parent, &overlay.ends_with_parent),
            ends_parent: pick(&self.ends_parent, &overlay.ends_parent),
            end_same_as_begin: pick(&self.end_same_as_begin, &overlay.end_same_as_begin),
            skip: pick(&self.skip, &overlay.skip),
            exclude_begin: pick(&self.exclude_begin, &overlay.exclude_begin),
            exclude_end: pick(&self.exclude_end, &overlay.exclude_end),
            return_begin: pick(&self.return_begin, &overlay.return_begin),
            return_end: pick(&self.return_end, &overlay.return_end),
            sub_language: pick(&self.sub_language, &overlay.sub_language),
            on_begin: pick(&self.on_begin, &overlay.on_begin),
            on_end: pick(&self.on_end, &overlay.on_end),
        }
    }

    /// Whether the compiled form of this mode depends on its parent
    /// (its end, or the end of its `starts` chain, inherits the parent's).
    pub(crate) fn depends_on_parent(&self) -> bool {
        self.ends_with_parent == Some(true)
            || self.starts.as_ref().is_some_and(|s| s.depends_on_parent())
    }
}

/// A complete named language definition
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Language {
    /// Display name; defaults to the registration name
    pub name: Option<String>,
    pub aliases: Vec<String>,
    pub case_insensitive: bool,
    /// Never consider this grammar during auto-detection
    pub disable_autodetect: bool,
    /// Name of a grammar this one extends; wins exact ties against it
    pub superset_of: Option<String>,
    /// Displayed class for an internal category name
    pub class_name_aliases: HashMap<String, String>,
    /// Root mode: keywords, illegal and contains of the language itself
    #[serde(flatten)]
    pub root: Mode,
}

impl Language {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn disable_autodetect(mut self) -> Self {
        self.disable_autodetect = true;
        self
    }

    pub fn superset_of(mut self, base: impl Into<String>) -> Self {
        self.superset_of = Some(base.into());
        self
    }

    pub fn class_name_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.class_name_aliases.insert(from.into(), to.into());
        self
    }

    pub fn keywords(mut self, keywords: impl Into<Keywords>) -> Self {
        self.root = self.root.keywords(keywords);
        self
    }

    pub fn illegal(mut self, pattern: impl Into<String>) -> Self {
        self.root = self.root.illegal(pattern);
        self
    }

    pub fn illegal_any<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root = self.root.illegal_any(patterns);
        self
    }

    pub fn contains<I, R>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ModeRef>,
    {
        self.root = self.root.contains(children);
        self
    }

    pub fn contain(mut self, child: impl Into<ModeRef>) -> Self {
        self.root = self.root.contain(child);
        self
    }

    /// The language that highlights nothing
    pub fn plaintext() -> Self {
        Language::new("Plain text").disable_autodetect()
    }

    /// Parse a grammar from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HighlightError::Config(format!("invalid grammar: {}", e)))
    }

    /// Load a grammar from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read grammar file {}", path.display()))?;
        let language = Self::from_json(&content)
            .with_context(|| format!("Failed to parse grammar file {}", path.display()))?;
        Ok(language)
    }
}
