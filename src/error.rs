//! Error taxonomy for grammar compilation and highlighting
//!
//! Compiler errors surface when a language is registered; tokenizer errors
//! surface at the call that triggered them. Every variant owns its data so a
//! result can carry the error it recovered from (see `HighlightResult::error_raised`).

use thiserror::Error;

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, HighlightError>;

/// Everything that can go wrong while compiling a grammar or highlighting text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    /// The grammar definition is malformed
    #[error("invalid grammar for language `{language}`: {message}")]
    Configuration { language: String, message: String },

    /// No grammar is registered under this name or alias
    #[error("unknown language: `{0}` is not registered")]
    UnknownLanguage(String),

    /// Text that a mode declares illegal appeared inside that mode
    #[error("illegal lexeme \"{lexeme}\" for mode \"{mode}\" at offset {offset}")]
    IllegalLexeme {
        language: String,
        mode: String,
        lexeme: String,
        offset: usize,
        /// Text window around the failure point
        context: String,
    },

    /// A begin and an end rule both matched the empty string at the same offset
    #[error("0 width match regex in language `{language}` (rule: {rule})")]
    ZeroWidthMatch { language: String, rule: String },

    /// Iteration guard tripped: far more iterations than matched input
    #[error("potential infinite loop in language `{language}`: {iterations} iterations, way more than matches")]
    InfiniteLoop { language: String, iterations: usize },

    /// The regex engine gave up while scanning (e.g. backtrack limit)
    #[error("regex `{pattern}` failed: {message}")]
    Regex { pattern: String, message: String },

    /// Invalid configuration document
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HighlightError {
    pub(crate) fn configuration(language: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            language: language.to_string(),
            message: message.into(),
        }
    }

    /// Whether this is an illegal-lexeme failure
    pub fn is_illegal(&self) -> bool {
        matches!(self, Self::IllegalLexeme { .. })
    }
}
