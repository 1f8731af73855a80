//! Multi-pattern matcher
//!
//! Every mode owns an ordered rule list: the begin pattern of each child it
//! may contain, then its own end terminator, then its illegal pattern. The
//! rules are joined into one alternation so a single scan finds the leftmost
//! match among all of them; the first participating wrapper group tells
//! which rule matched.
//!
//! After a begin match is rejected by a guard, scanning resumes at the same
//! offset with the rules *after* the rejected one. Each distinct starting
//! rule gets its own combined regex, built on first use and kept.

use fancy_regex::Regex;
use once_cell::sync::OnceCell;

use super::patterns::{self, join_renumbered, next_char_boundary};
use super::ModeId;
use crate::error::{HighlightError, Result};

/// What a rule does when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Enter the given child mode
    Begin(ModeId),
    /// Leave the current mode (or an ancestor)
    End,
    /// Forbidden text
    Illegal,
}

#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub kind: RuleKind,
    pub source: String,
    groups: usize,
}

/// A match found by the matcher, as seen by guard callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    index: usize,
    /// Group 0 is the whole match, then the rule's own groups
    groups: Vec<Option<String>>,
    kind: RuleKind,
    /// Index of the rule in the mode's full rule list
    position: usize,
}

impl RuleMatch {
    /// Byte offset of the match in the input
    pub fn index(&self) -> usize {
        self.index
    }

    /// The matched text
    pub fn lexeme(&self) -> &str {
        self.groups
            .first()
            .and_then(|g| g.as_deref())
            .unwrap_or_default()
    }

    /// Byte offset just past the match
    pub fn end(&self) -> usize {
        self.index + self.lexeme().len()
    }

    /// Capture group `n` of the matching rule's own pattern
    pub fn group(&self, n: usize) -> Option<&str> {
        self.groups.get(n).and_then(|g| g.as_deref())
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }
}

/// Scan state of one matcher: where to scan from, and which rule to start at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MatcherCursor {
    pub last_index: usize,
    pub regex_index: usize,
}

impl MatcherCursor {
    pub fn consider_all(&mut self) {
        self.regex_index = 0;
    }
}

/// One combined regex over `rules[first_rule..]`
#[derive(Debug)]
struct MultiRegex {
    regex: Option<Regex>,
    source: String,
    /// Wrapper group number of each rule, in rule order
    group_starts: Vec<usize>,
    first_rule: usize,
}

impl MultiRegex {
    fn build(rules: &[Rule], first_rule: usize, case_insensitive: bool) -> std::result::Result<Self, (String, fancy_regex::Error)> {
        let slice = &rules[first_rule.min(rules.len())..];
        let mut group_starts = Vec::with_capacity(slice.len());
        let mut match_at = 1;
        for rule in slice {
            group_starts.push(match_at);
            match_at += rule.groups + 1;
        }

        if slice.is_empty() {
            return Ok(Self {
                regex: None,
                source: String::new(),
                group_starts,
                first_rule,
            });
        }

        let sources: Vec<&str> = slice.iter().map(|r| r.source.as_str()).collect();
        let source = join_renumbered(&sources, "|");
        let regex = patterns::compile(&source, case_insensitive).map_err(|e| (source.clone(), e))?;
        Ok(Self {
            regex: Some(regex),
            source,
            group_starts,
            first_rule,
        })
    }

    fn exec(&self, rules: &[Rule], text: &str, from: usize) -> Result<Option<RuleMatch>> {
        let Some(regex) = &self.regex else {
            return Ok(None);
        };
        if from > text.len() {
            return Ok(None);
        }
        let caps = regex
            .captures_from_pos(text, from)
            .map_err(|e| HighlightError::Regex {
                pattern: self.source.clone(),
                message: e.to_string(),
            })?;
        let Some(caps) = caps else {
            return Ok(None);
        };
        let Some(whole) = caps.get(0) else {
            return Ok(None);
        };

        for (offset, &group) in self.group_starts.iter().enumerate() {
            if caps.get(group).is_none() {
                continue;
            }
            let position = self.first_rule + offset;
            let rule = &rules[position];
            let groups = (group..=group + rule.groups)
                .map(|g| caps.get(g).map(|m| m.as_str().to_string()))
                .collect();
            return Ok(Some(RuleMatch {
                index: whole.start(),
                groups,
                kind: rule.kind,
                position,
            }));
        }
        Ok(None)
    }
}

/// All the rules of one mode, with a lazily built regex per starting rule
#[derive(Debug)]
pub(crate) struct ModeMatcher {
    rules: Vec<Rule>,
    case_insensitive: bool,
    compiled: Vec<OnceCell<MultiRegex>>,
}

impl ModeMatcher {
    /// Validate every rule and build the full alternation up front
    pub fn new(
        rules: Vec<(RuleKind, String)>,
        case_insensitive: bool,
        language: &str,
    ) -> Result<Self> {
        let mut checked = Vec::with_capacity(rules.len());
        for (kind, source) in rules {
            let groups = patterns::count_groups(&source).map_err(|e| {
                HighlightError::configuration(language, format!("invalid pattern `{}`: {}", source, e))
            })?;
            checked.push(Rule {
                kind,
                source,
                groups,
            });
        }

        let compiled = (0..checked.len().max(1)).map(|_| OnceCell::new()).collect();
        let matcher = Self {
            rules: checked,
            case_insensitive,
            compiled,
        };
        matcher.multi_regex(0).map_err(|e| match e {
            HighlightError::Regex { pattern, message } => HighlightError::configuration(
                language,
                format!("invalid combined pattern `{}`: {}", pattern, message),
            ),
            other => other,
        })?;
        Ok(matcher)
    }

    /// A matcher with no rules, never matching
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            case_insensitive: false,
            compiled: vec![OnceCell::new()],
        }
    }

    fn multi_regex(&self, first_rule: usize) -> Result<&MultiRegex> {
        let Some(cell) = self.compiled.get(first_rule) else {
            return Err(HighlightError::Regex {
                pattern: String::new(),
                message: format!("no rule at index {}", first_rule),
            });
        };
        cell.get_or_try_init(|| {
            MultiRegex::build(&self.rules, first_rule, self.case_insensitive).map_err(|(pattern, e)| {
                HighlightError::Regex {
                    pattern,
                    message: e.to_string(),
                }
            })
        })
    }

    /// Find the next match at or after `cursor.last_index`.
    ///
    /// When resuming after a rejected begin match, only a match at exactly
    /// the same offset is taken from the remaining rules; otherwise every
    /// rule is reconsidered from the next character on, so scanning always
    /// moves forward.
    pub fn exec(&self, cursor: &mut MatcherCursor, text: &str) -> Result<Option<RuleMatch>> {
        let mut found = self
            .multi_regex(cursor.regex_index)?
            .exec(&self.rules, text, cursor.last_index)?;

        if cursor.regex_index != 0 && !found.as_ref().is_some_and(|m| m.index == cursor.last_index) {
            found = match next_char_boundary(text, cursor.last_index) {
                Some(next) => self.multi_regex(0)?.exec(&self.rules, text, next)?,
                None => None,
            };
        }

        if let Some(m) = &found {
            cursor.regex_index = m.position + 1;
            if cursor.regex_index >= self.rules.len() {
                cursor.consider_all();
            }
        }
        Ok(found)
    }
}
