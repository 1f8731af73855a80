//! Highlighting facade
//!
//! [`Highlighter`] owns a [`LanguageRegistry`] and a [`HighlightConfig`] and
//! exposes the public operations: registering grammars, highlighting with a
//! named language, auto-detecting the language, and post-processing markup.
//!
//! Nothing here is global. Two highlighters never share grammars or options.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use crate::compiler::CompiledLanguage;
use crate::config::{HighlightConfig, PartialHighlightConfig};
use crate::detect;
use crate::emitter::{Emitter, TokenTree};
use crate::error::Result;
use crate::grammar::helpers::Helpers;
use crate::grammar::Language;
use crate::languages;
use crate::registry::LanguageRegistry;
use crate::tokenizer::{self, HighlightResult, ModeStack};

/// Per-call options of [`Highlighter::highlight`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightOptions<'a> {
    /// Treat illegal lexemes as plain text instead of failing
    pub ignore_illegals: bool,
    /// Resume from the mode stack of an earlier result (`result.top`)
    pub continuation: Option<&'a ModeStack>,
}

impl<'a> HighlightOptions<'a> {
    pub fn lenient() -> Self {
        Self {
            ignore_illegals: true,
            continuation: None,
        }
    }

    pub fn continue_from(mut self, stack: &'a ModeStack) -> Self {
        self.continuation = Some(stack);
        self
    }
}

/// Grammar registry plus options
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    registry: LanguageRegistry,
    config: HighlightConfig,
}

impl Highlighter {
    /// A highlighter with no grammars and default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HighlightConfig) -> Self {
        Self {
            registry: LanguageRegistry::new(),
            config,
        }
    }

    /// A highlighter with the bundled grammars registered
    pub fn with_builtin_languages() -> Result<Self> {
        let mut highlighter = Self::new();
        languages::register_builtin(&mut highlighter.registry)?;
        Ok(highlighter)
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Merge option overrides into the current configuration
    pub fn configure(&mut self, partial: PartialHighlightConfig) {
        self.config.apply(partial);
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Build a grammar with `factory` and register it under `name`
    pub fn register_language<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: FnOnce(&Helpers) -> Language,
    {
        self.registry.register(name, factory)
    }

    /// Register a grammar loaded from a JSON file
    pub fn register_language_file<P: AsRef<Path>>(&mut self, name: &str, path: P) -> anyhow::Result<()> {
        let language = Language::from_file(path)?;
        self.registry.register_language(name, &language)?;
        Ok(())
    }

    pub fn unregister_language(&mut self, name: &str) -> bool {
        self.registry.unregister(name)
    }

    pub fn register_aliases<I, S>(&mut self, aliases: I, name: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.register_aliases(aliases, name);
    }

    /// Registered names, in registration order
    pub fn list_languages(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    /// Look a compiled grammar up by name or alias
    pub fn get_language(&self, name: &str) -> Option<&Arc<CompiledLanguage>> {
        self.registry.get(name)
    }

    /// Whether `name` is registered and takes part in auto-detection
    pub fn auto_detection(&self, name: &str) -> bool {
        self.registry.auto_detection(name)
    }

    /// Registered name for a file, looked up by its extension as a name or alias
    pub fn language_for_path(&self, path: &Path) -> Option<&str> {
        let extension = path.extension()?.to_str()?;
        self.registry.canonical_name(extension)
    }

    /// Highlight `code` as `language` into a token tree
    pub fn highlight(&self, code: &str, language: &str, options: HighlightOptions<'_>) -> Result<HighlightResult> {
        self.highlight_with(code, language, options)
    }

    /// Highlight `code` as `language` with a caller-chosen emitter
    pub fn highlight_with<E: Emitter>(
        &self,
        code: &str,
        language: &str,
        options: HighlightOptions<'_>,
    ) -> Result<HighlightResult<E>> {
        tokenizer::highlight(
            &self.registry,
            &self.config,
            language,
            code,
            options.ignore_illegals,
            options.continuation,
        )
    }

    /// Highlight `code` with the best scoring grammar among `subset`, the
    /// configured languages, or every registered grammar
    pub fn highlight_auto(&self, code: &str, subset: Option<&[String]>) -> Result<HighlightResult> {
        self.highlight_auto_with(code, subset)
    }

    pub fn highlight_auto_with<E: Emitter>(
        &self,
        code: &str,
        subset: Option<&[String]>,
    ) -> Result<HighlightResult<E>> {
        detect::highlight_auto(&self.registry, &self.config, code, subset)
    }

    /// Apply `tab_replace` and `use_line_breaks_as_element` to rendered markup
    pub fn fix_markup<'a>(&self, html: &'a str) -> Cow<'a, str> {
        self.config.fix_markup(html)
    }

    /// Render a token tree with this highlighter's class prefix and markup options
    pub fn render(&self, tree: &TokenTree) -> String {
        let html = tree.root().render_html(&self.config.class_prefix);
        self.fix_markup(&html).into_owned()
    }
}
