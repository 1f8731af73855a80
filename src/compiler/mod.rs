//! Mode Compiler
//!
//! Turns a [`Language`] definition into a [`CompiledLanguage`]: a flat arena
//! of [`CompiledMode`]s addressed by [`ModeId`]. Nested and recursive modes
//! become indices into the arena, so `contains: [self]` and mutually
//! recursive modes need no ownership cycles.
//!
//! Compilation is memoised per `Rc<Mode>` identity (per variant, and per
//! parent for modes whose end depends on the parent). A mode's id is
//! registered before its children are compiled, which is what terminates
//! recursion through cycles.

pub mod matcher;
pub mod patterns;

use std::collections::HashMap;
use std::rc::Rc;

use fancy_regex::Regex;

use crate::error::{HighlightError, Result};
use crate::grammar::{
    Illegal, KeywordTable, Keywords, Language, MatchGuard, Mode, ModeRef, SubLanguage,
};
use matcher::{ModeMatcher, RuleKind};
use patterns::EMPTY_MATCH_RE;

/// Default keyword scan pattern
const DEFAULT_KEYWORD_PATTERN: &str = r"\w+";

/// Handle of a compiled mode inside its [`CompiledLanguage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub(crate) usize);

impl ModeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A mode after compilation
#[derive(Debug)]
pub struct CompiledMode {
    pub(crate) class_name: Option<String>,
    pub(crate) begin: String,
    /// End pattern as written (`None` when the mode only ends with its parent)
    pub(crate) end: Option<String>,
    pub(crate) end_re: Option<Regex>,
    /// Combined end of this mode and, through `ends_with_parent`, its ancestors
    pub(crate) terminator_end: String,
    pub(crate) illegal: Option<String>,
    pub(crate) keywords: Option<KeywordTable>,
    pub(crate) keyword_pattern: Regex,
    pub(crate) relevance: u32,
    pub(crate) ends_with_parent: bool,
    pub(crate) ends_parent: bool,
    pub(crate) end_same_as_begin: bool,
    pub(crate) skip: bool,
    pub(crate) exclude_begin: bool,
    pub(crate) exclude_end: bool,
    pub(crate) return_begin: bool,
    pub(crate) return_end: bool,
    pub(crate) sub_language: Option<SubLanguage>,
    /// Set for `begin_keywords` modes: a match right after `.` is rejected
    pub(crate) skip_after_dot: bool,
    pub(crate) on_begin: Option<MatchGuard>,
    pub(crate) on_end: Option<MatchGuard>,
    pub(crate) children: Vec<ModeId>,
    pub(crate) starts: Option<ModeId>,
    pub(crate) matcher: ModeMatcher,
}

impl CompiledMode {
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn relevance(&self) -> u32 {
        self.relevance
    }

    pub fn children(&self) -> &[ModeId] {
        &self.children
    }

    pub fn starts(&self) -> Option<ModeId> {
        self.starts
    }

    pub fn terminator_end(&self) -> &str {
        &self.terminator_end
    }
}

/// A language ready for tokenizing; immutable once built
#[derive(Debug)]
pub struct CompiledLanguage {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) case_insensitive: bool,
    pub(crate) disable_autodetect: bool,
    pub(crate) superset_of: Option<String>,
    pub(crate) class_name_aliases: HashMap<String, String>,
    pub(crate) modes: Vec<CompiledMode>,
}

impl CompiledLanguage {
    /// Compile `language`; `fallback_name` is used when it declares no name
    pub fn compile(language: &Language, fallback_name: &str) -> Result<Self> {
        let name = language
            .name
            .clone()
            .unwrap_or_else(|| fallback_name.to_string());
        let mut compiler = ModeCompiler {
            language: &name,
            case_insensitive: language.case_insensitive,
            modes: Vec::new(),
            memo: HashMap::new(),
        };
        compiler.compile_root(&language.root)?;

        Ok(Self {
            aliases: language.aliases.clone(),
            case_insensitive: language.case_insensitive,
            disable_autodetect: language.disable_autodetect,
            superset_of: language.superset_of.clone(),
            class_name_aliases: language.class_name_aliases.clone(),
            modes: compiler.modes,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn disable_autodetect(&self) -> bool {
        self.disable_autodetect
    }

    pub fn superset_of(&self) -> Option<&str> {
        self.superset_of.as_deref()
    }

    pub fn root(&self) -> ModeId {
        ModeId(0)
    }

    /// Only for ids handed out by this language's own arena
    pub(crate) fn mode(&self, id: ModeId) -> &CompiledMode {
        &self.modes[id.0]
    }

    /// `None` for an id that belongs to another language
    pub fn get_mode(&self, id: ModeId) -> Option<&CompiledMode> {
        self.modes.get(id.0)
    }

    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Displayed class for a category, after `class_name_aliases`
    pub fn display_class<'a>(&'a self, category: &'a str) -> &'a str {
        self.class_name_aliases
            .get(category)
            .map(String::as_str)
            .unwrap_or(category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MemoKey {
    mode: usize,
    variant: Option<usize>,
    parent: Option<ModeId>,
}

struct ModeCompiler<'a> {
    language: &'a str,
    case_insensitive: bool,
    modes: Vec<CompiledMode>,
    memo: HashMap<MemoKey, ModeId>,
}

impl ModeCompiler<'_> {
    fn error(&self, message: impl Into<String>) -> HighlightError {
        HighlightError::configuration(self.language, message)
    }

    fn compile_root(&mut self, root: &Mode) -> Result<ModeId> {
        if root
            .contains
            .as_ref()
            .is_some_and(|c| c.iter().any(ModeRef::is_self))
        {
            return Err(self.error("contains `self` is not supported at the top-level of a language"));
        }
        self.compile_mode(root, None, None)
    }

    fn compile_mode(&mut self, mode: &Mode, key: Option<MemoKey>, parent: Option<ModeId>) -> Result<ModeId> {
        if let Some(id) = key.and_then(|k| self.memo.get(&k)) {
            return Ok(*id);
        }

        let compiled = self.compile_own_fields(mode, parent)?;
        let id = ModeId(self.modes.len());
        self.modes.push(compiled);
        if let Some(key) = key {
            self.memo.insert(key, id);
        }

        let mut children = Vec::new();
        for child in mode.contains.iter().flatten() {
            match child {
                ModeRef::SelfRef => children.push(id),
                ModeRef::Mode(rc) => children.extend(self.expand_child(rc, id)?),
                ModeRef::Late(slot) => {
                    let Some(rc) = slot.get() else {
                        return Err(self.error("a late mode reference was never set"));
                    };
                    let rc = Rc::clone(rc);
                    children.extend(self.expand_child(&rc, id)?);
                }
            }
        }

        let starts = match &mode.starts {
            Some(starts) => {
                let key = self.key_for(starts, None, starts.depends_on_parent(), parent);
                Some(self.compile_mode(starts, Some(key), parent)?)
            }
            None => None,
        };

        let matcher = self.build_matcher(id, &children)?;
        let compiled = &mut self.modes[id.0];
        compiled.children = children;
        compiled.starts = starts;
        compiled.matcher = matcher;
        Ok(id)
    }

    /// A child reference becomes one compiled mode, or one per variant
    fn expand_child(&mut self, child: &Rc<Mode>, parent: ModeId) -> Result<Vec<ModeId>> {
        match child.variants.as_deref() {
            Some(variants) if !variants.is_empty() => {
                let mut ids = Vec::with_capacity(variants.len());
                for (i, variant) in variants.iter().enumerate() {
                    if variant.variants.as_ref().is_some_and(|v| !v.is_empty()) {
                        return Err(self.error("variants must not contain nested variants"));
                    }
                    let merged = child.merge(variant);
                    let key = self.key_for(child, Some(i), merged.depends_on_parent(), Some(parent));
                    ids.push(self.compile_mode(&merged, Some(key), Some(parent))?);
                }
                Ok(ids)
            }
            _ => {
                let key = self.key_for(child, None, child.depends_on_parent(), Some(parent));
                Ok(vec![self.compile_mode(child, Some(key), Some(parent))?])
            }
        }
    }

    fn key_for(&self, mode: &Rc<Mode>, variant: Option<usize>, per_parent: bool, parent: Option<ModeId>) -> MemoKey {
        MemoKey {
            mode: Rc::as_ptr(mode) as usize,
            variant,
            parent: if per_parent { parent } else { None },
        }
    }

    fn compile_own_fields(&self, mode: &Mode, parent: Option<ModeId>) -> Result<CompiledMode> {
        let mut begin = mode.begin.clone();
        if let Some(pattern) = &mode.match_pattern {
            if mode.begin.is_some() || mode.end.is_some() {
                return Err(self.error("begin & end are not supported with match"));
            }
            begin = Some(pattern.clone());
        }

        let mut keywords = mode.keywords.clone();
        let mut relevance = mode.relevance;
        let mut skip_after_dot = false;
        if let (Some(words), Some(_)) = (&mode.begin_keywords, parent) {
            let alternation = words.split_whitespace().collect::<Vec<_>>().join("|");
            begin = Some(format!(r"\b({})(?!\.)(?=\b|\s)", alternation));
            skip_after_dot = true;
            if keywords.is_none() {
                keywords = Some(Keywords::words(words));
            }
            if relevance.is_none() {
                relevance = Some(0);
            }
        }

        let illegal = match &mode.illegal {
            Some(Illegal::One(pattern)) => Some(pattern.clone()),
            Some(Illegal::Any(patterns)) if !patterns.is_empty() => {
                let parts: Vec<&str> = patterns.iter().map(String::as_str).collect();
                Some(patterns::either(&parts))
            }
            _ => None,
        };

        let explicit_pattern = keywords.as_ref().and_then(|k| k.keyword_pattern().map(str::to_string));
        if explicit_pattern.is_some() && mode.lexemes.is_some() {
            return Err(self.error(
                "prefer `keywords.$pattern` to `lexemes`, both are not allowed",
            ));
        }
        let keyword_source = explicit_pattern
            .or_else(|| mode.lexemes.clone())
            .unwrap_or_else(|| DEFAULT_KEYWORD_PATTERN.to_string());
        let keyword_pattern = self.regex(&keyword_source)?;
        let keywords = keywords
            .as_ref()
            .map(|k| KeywordTable::compile(k, self.case_insensitive, self.language))
            .transpose()?;

        let ends_with_parent = mode.ends_with_parent.unwrap_or(false);
        let end_same_as_begin = mode.end_same_as_begin.unwrap_or(false);
        let (begin, end, terminator_end) = match parent {
            Some(parent) => {
                let begin = begin.unwrap_or_else(|| EMPTY_MATCH_RE.to_string());
                let mut end = mode.end.clone();
                if end_same_as_begin {
                    end = Some(begin.clone());
                }
                if end.is_none() && !ends_with_parent {
                    end = Some(EMPTY_MATCH_RE.to_string());
                }
                let mut terminator = end.clone().unwrap_or_default();
                let parent_terminator = &self.modes[parent.0].terminator_end;
                if ends_with_parent && !parent_terminator.is_empty() {
                    if end.is_some() {
                        terminator.push('|');
                    }
                    terminator.push_str(parent_terminator);
                }
                (begin, end, terminator)
            }
            None => (String::new(), None, String::new()),
        };
        let end_re = end.as_deref().map(|e| self.regex(e)).transpose()?;

        Ok(CompiledMode {
            class_name: mode.class_name.clone(),
            begin,
            end,
            end_re,
            terminator_end,
            illegal,
            keywords,
            keyword_pattern,
            relevance: relevance.unwrap_or(1),
            ends_with_parent,
            ends_parent: mode.ends_parent.unwrap_or(false),
            end_same_as_begin,
            skip: mode.skip.unwrap_or(false),
            exclude_begin: mode.exclude_begin.unwrap_or(false),
            exclude_end: mode.exclude_end.unwrap_or(false),
            return_begin: mode.return_begin.unwrap_or(false),
            return_end: mode.return_end.unwrap_or(false),
            sub_language: mode.sub_language.clone(),
            skip_after_dot,
            on_begin: mode.on_begin.clone(),
            on_end: mode.on_end.clone(),
            children: Vec::new(),
            starts: None,
            matcher: ModeMatcher::empty(),
        })
    }

    /// Rules in order: each child's begin, own terminator, illegal
    fn build_matcher(&self, id: ModeId, children: &[ModeId]) -> Result<ModeMatcher> {
        let mode = &self.modes[id.0];
        let mut rules: Vec<(RuleKind, String)> = children
            .iter()
            .map(|child| (RuleKind::Begin(*child), self.modes[child.0].begin.clone()))
            .collect();
        if !mode.terminator_end.is_empty() {
            rules.push((RuleKind::End, mode.terminator_end.clone()));
        }
        if let Some(illegal) = &mode.illegal {
            rules.push((RuleKind::Illegal, illegal.clone()));
        }
        ModeMatcher::new(rules, self.case_insensitive, self.language)
    }

    fn regex(&self, source: &str) -> Result<Regex> {
        patterns::compile(source, self.case_insensitive)
            .map_err(|e| self.error(format!("invalid pattern `{}`: {}", source, e)))
    }
}
