//! Highlighter configuration
//!
//! [`HighlightConfig`] is the full set of options. [`PartialHighlightConfig`]
//! carries only the options a caller wants to change and is merged on top of
//! an existing configuration. Configuration documents are JSON; option names
//! are accepted in snake_case and in their camelCase spelling. Unrecognised
//! options are logged and ignored.

use std::borrow::Cow;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{HighlightError, Result};

/// Every option name a configuration document may use
pub const RECOGNIZED_OPTIONS: &[&str] = &[
    "class_prefix",
    "classPrefix",
    "tab_replace",
    "tabReplace",
    "use_line_breaks_as_element",
    "useLineBreaksAsElement",
    "useBR",
    "languages",
    "safe_mode",
    "safeMode",
];

/// Leading tabs (possibly behind opening tags) at the start of a line, or a newline
static FIX_MARKUP_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"(?m)^(?:<[^>]+>|\t)+|\n").expect("markup pattern is valid"));

fn default_class_prefix() -> String {
    "hljs-".to_string()
}

fn default_true() -> bool {
    true
}

/// Options shared by every highlight call of a [`crate::Highlighter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Prepended to every category to form the CSS class
    #[serde(default = "default_class_prefix", alias = "classPrefix")]
    pub class_prefix: String,

    /// Replacement for leading tabs in rendered markup
    #[serde(default, alias = "tabReplace")]
    pub tab_replace: Option<String>,

    /// Emit `<br>` instead of newlines in rendered markup
    #[serde(default, alias = "useLineBreaksAsElement", alias = "useBR")]
    pub use_line_breaks_as_element: bool,

    /// Auto-detection candidates when none are given (all languages when unset)
    #[serde(default)]
    pub languages: Option<Vec<String>>,

    /// Recover from misbehaving grammars instead of failing
    #[serde(default = "default_true", alias = "safeMode")]
    pub safe_mode: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            class_prefix: default_class_prefix(),
            tab_replace: None,
            use_line_breaks_as_element: false,
            languages: None,
            safe_mode: true,
        }
    }
}

impl HighlightConfig {
    /// Parse a configuration document; unrecognised options are ignored
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config = Self::default();
        config.apply(PartialHighlightConfig::from_json_str(json)?);
        Ok(config)
    }

    /// Load a configuration document from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Overwrite every option `partial` sets
    pub fn apply(&mut self, partial: PartialHighlightConfig) {
        if let Some(class_prefix) = partial.class_prefix {
            self.class_prefix = class_prefix;
        }
        if let Some(tab_replace) = partial.tab_replace {
            self.tab_replace = Some(tab_replace);
        }
        if let Some(use_br) = partial.use_line_breaks_as_element {
            self.use_line_breaks_as_element = use_br;
        }
        if let Some(languages) = partial.languages {
            self.languages = Some(languages);
        }
        if let Some(safe_mode) = partial.safe_mode {
            self.safe_mode = safe_mode;
        }
    }

    /// Post-process rendered markup: replace leading tabs and turn newlines
    /// into `<br>` as configured
    pub fn fix_markup<'a>(&self, html: &'a str) -> Cow<'a, str> {
        if self.tab_replace.is_none() && !self.use_line_breaks_as_element {
            return Cow::Borrowed(html);
        }
        FIX_MARKUP_RE.replace_all(html, |caps: &regex::Captures<'_>| {
            let matched = &caps[0];
            if matched == "\n" {
                return if self.use_line_breaks_as_element {
                    "<br>".to_string()
                } else {
                    matched.to_string()
                };
            }
            match &self.tab_replace {
                Some(tab) => matched.replace('\t', tab),
                None => matched.to_string(),
            }
        })
    }
}

/// A set of option overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialHighlightConfig {
    #[serde(default, alias = "classPrefix", skip_serializing_if = "Option::is_none")]
    pub class_prefix: Option<String>,
    #[serde(default, alias = "tabReplace", skip_serializing_if = "Option::is_none")]
    pub tab_replace: Option<String>,
    #[serde(
        default,
        alias = "useLineBreaksAsElement",
        alias = "useBR",
        skip_serializing_if = "Option::is_none"
    )]
    pub use_line_breaks_as_element: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, alias = "safeMode", skip_serializing_if = "Option::is_none")]
    pub safe_mode: Option<bool>,
}

impl PartialHighlightConfig {
    /// Parse overrides from a JSON object. Unrecognised options are logged
    /// and ignored; a document that is not an object is an error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| HighlightError::Config(e.to_string()))?;
        let serde_json::Value::Object(map) = value else {
            return Err(HighlightError::Config(
                "configuration must be a JSON object".to_string(),
            ));
        };

        let (known, unknown): (serde_json::Map<_, _>, serde_json::Map<_, _>) = map
            .into_iter()
            .partition(|(key, _)| RECOGNIZED_OPTIONS.contains(&key.as_str()));
        for key in unknown.keys() {
            tracing::warn!("Ignoring unrecognized highlight option '{}'", key);
        }

        serde_json::from_value(serde_json::Value::Object(known))
            .map_err(|e| HighlightError::Config(e.to_string()))
    }
}
