//! Keyword declarations and their compiled lookup table
//!
//! A declaration is a space separated string, a flat list, or a
//! category → words mapping. Each word may carry an explicit `|weight`
//! suffix; otherwise it is worth 1, except for a few closed-class words that
//! show up in almost every language and are worth nothing.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::error::{HighlightError, Result};

/// Words too common across languages to count as evidence for any of them
pub const COMMON_KEYWORDS: [&str; 11] = [
    "of", "and", "for", "in", "not", "or", "if", "then", "parent", "list", "value",
];

/// Category used when keywords are declared without one
pub const DEFAULT_KEYWORD_CATEGORY: &str = "keyword";

/// Key used in JSON grammars to override the keyword scan pattern
const PATTERN_KEY: &str = "$pattern";

/// Keyword declaration of a mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keywords {
    pub(crate) pattern: Option<String>,
    pub(crate) categories: Vec<(String, Vec<String>)>,
}

impl Keywords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Space separated words in the default `keyword` category
    pub fn words(words: &str) -> Self {
        Self::new().category(DEFAULT_KEYWORD_CATEGORY, words)
    }

    /// Add a category of space separated words
    pub fn category(self, name: impl Into<String>, words: &str) -> Self {
        self.category_list(name, words.split_whitespace())
    }

    /// Add a category from a list of words
    pub fn category_list<I, S>(mut self, name: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .push((name.into(), words.into_iter().map(Into::into).collect()));
        self
    }

    /// Override what a "word" looks like when scanning for keywords
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// The keyword scan pattern override, if any
    pub fn keyword_pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|(_, words)| words.is_empty())
    }
}

impl From<&str> for Keywords {
    fn from(words: &str) -> Self {
        Keywords::words(words)
    }
}

impl From<String> for Keywords {
    fn from(words: String) -> Self {
        Keywords::words(&words)
    }
}

impl From<Vec<&str>> for Keywords {
    fn from(words: Vec<&str>) -> Self {
        Keywords::new().category_list(DEFAULT_KEYWORD_CATEGORY, words)
    }
}

/// Category and weight of one keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeywordEntry {
    pub category: String,
    pub relevance: u32,
}

/// Compiled keyword lookup table of one mode
#[derive(Debug, Clone, Default)]
pub(crate) struct KeywordTable {
    entries: HashMap<String, KeywordEntry>,
}

impl KeywordTable {
    pub fn compile(keywords: &Keywords, case_insensitive: bool, language: &str) -> Result<Self> {
        let mut entries = HashMap::new();
        for (category, words) in &keywords.categories {
            for word in words {
                let word = if case_insensitive {
                    word.to_lowercase()
                } else {
                    word.clone()
                };
                let (key, weight) = match word.split_once('|') {
                    Some((key, weight)) => (key, Some(weight)),
                    None => (word.as_str(), None),
                };
                let relevance = keyword_relevance(key, weight).ok_or_else(|| {
                    HighlightError::configuration(
                        language,
                        format!("invalid weight `{}` for keyword `{}`", weight.unwrap_or(""), key),
                    )
                })?;
                entries.insert(
                    key.to_string(),
                    KeywordEntry {
                        category: category.clone(),
                        relevance,
                    },
                );
            }
        }
        Ok(Self { entries })
    }

    /// Look a scanned word up, folding case when the grammar asks for it
    pub fn get(&self, word: &str, case_insensitive: bool) -> Option<&KeywordEntry> {
        if case_insensitive {
            self.entries.get(&word.to_lowercase())
        } else {
            self.entries.get(word)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn keyword_relevance(word: &str, weight: Option<&str>) -> Option<u32> {
    match weight {
        Some(weight) => weight.trim().parse().ok(),
        None if is_common_keyword(word) => Some(0),
        None => Some(1),
    }
}

fn is_common_keyword(word: &str) -> bool {
    let lower = word.to_lowercase();
    COMMON_KEYWORDS.contains(&lower.as_str())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WordList {
    Words(String),
    List(Vec<String>),
}

impl WordList {
    fn into_words(self) -> Vec<String> {
        match self {
            WordList::Words(s) => s.split_whitespace().map(str::to_string).collect(),
            WordList::List(list) => list,
        }
    }
}

struct KeywordsVisitor;

impl<'de> Visitor<'de> for KeywordsVisitor {
    type Value = Keywords;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a space separated string, a list of words, or a map of categories")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Keywords, E> {
        Ok(Keywords::words(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Keywords, A::Error> {
        let mut words = Vec::new();
        while let Some(word) = seq.next_element::<String>()? {
            words.push(word);
        }
        Ok(Keywords::new().category_list(DEFAULT_KEYWORD_CATEGORY, words))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Keywords, A::Error> {
        let mut keywords = Keywords::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == PATTERN_KEY {
                keywords.pattern = Some(map.next_value()?);
            } else {
                let words: WordList = map.next_value()?;
                keywords = keywords.category_list(key, words.into_words());
            }
        }
        Ok(keywords)
    }
}

impl<'de> Deserialize<'de> for Keywords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(KeywordsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let kw = Keywords::words("if then while");
        let table = KeywordTable::compile(&kw, false, "t").unwrap();
        assert_eq!(table.get("if", false).unwrap().relevance, 0);
        assert_eq!(table.get("then", false).unwrap().relevance, 0);
        assert_eq!(table.get("while", false).unwrap().relevance, 1);
        assert_eq!(table.get("while", false).unwrap().category, "keyword");
    }

    #[test]
    fn test_explicit_weight_suffix() {
        let kw = Keywords::new().category("built_in", "print|10 if|3");
        let table = KeywordTable::compile(&kw, false, "t").unwrap();
        let print = table.get("print", false).unwrap();
        assert_eq!(print.relevance, 10);
        assert_eq!(print.category, "built_in");
        assert_eq!(table.get("if", false).unwrap().relevance, 3);
        assert!(table.get("print|10", false).is_none());
    }

    #[test]
    fn test_invalid_weight_is_configuration_error() {
        let kw = Keywords::words("print|lots");
        let err = KeywordTable::compile(&kw, false, "t").unwrap_err();
        assert!(matches!(err, HighlightError::Configuration { .. }));
    }

    #[test]
    fn test_case_folding() {
        let kw = Keywords::words("SELECT From");
        let table = KeywordTable::compile(&kw, true, "sql").unwrap();
        assert!(table.get("select", true).is_some());
        assert!(table.get("SeLeCt", true).is_some());
        assert!(table.get("FROM", true).is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_later_category_wins_on_duplicates() {
        let kw = Keywords::new()
            .category("keyword", "null")
            .category("literal", "null");
        let table = KeywordTable::compile(&kw, false, "t").unwrap();
        assert_eq!(table.get("null", false).unwrap().category, "literal");
    }

    #[test]
    fn test_deserialize_all_shapes() {
        let from_str: Keywords = serde_json::from_str(r#""a b""#).unwrap();
        assert_eq!(from_str, Keywords::words("a b"));

        let from_list: Keywords = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(from_list, Keywords::words("a b"));

        let from_map: Keywords =
            serde_json::from_str(r#"{"$pattern": "[a-z]+", "keyword": "a b", "literal": ["c"]}"#)
                .unwrap();
        assert_eq!(from_map.keyword_pattern(), Some("[a-z]+"));
        assert_eq!(from_map.categories.len(), 2);
        assert_eq!(from_map.categories[1], ("literal".to_string(), vec!["c".to_string()]));
    }
}
