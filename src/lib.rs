// Highlighting library - grammar registry, mode compiler, tokenizer and emitters

// Core types and config
pub mod config;
pub mod error;

// Grammar definitions and their compiled form
pub mod compiler;
pub mod grammar;
pub mod languages;

// Highlighting runtime
pub mod detect;
pub mod emitter;
pub mod highlighter;
pub mod registry;
pub mod tokenizer;

pub use config::{HighlightConfig, PartialHighlightConfig};
pub use emitter::{Emitter, HtmlEmitter, Token, TokenNode, TokenTree};
pub use error::{HighlightError, Result};
pub use grammar::helpers::Helpers;
pub use grammar::{Keywords, Language, LateMode, MatchDecision, Mode, ModeRef};
pub use highlighter::{HighlightOptions, Highlighter};
pub use registry::LanguageRegistry;
pub use tokenizer::{HighlightResult, ModeStack};
