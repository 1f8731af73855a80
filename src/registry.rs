//! Grammar registry
//!
//! Maps language names and aliases to compiled grammars. Names and aliases
//! are case-folded. Grammars are compiled when they are registered, so a
//! malformed grammar is reported by the registration call and never enters
//! the registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::compiler::CompiledLanguage;
use crate::error::Result;
use crate::grammar::helpers::Helpers;
use crate::grammar::Language;

/// Registered grammars, in registration order
#[derive(Debug, Default, Clone)]
pub struct LanguageRegistry {
    languages: HashMap<String, Arc<CompiledLanguage>>,
    order: Vec<String>,
    /// alias → registered name
    aliases: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grammar with `factory` and register it under `name` and its
    /// declared aliases. Registering a name again replaces the grammar and
    /// drops the aliases that pointed at the old one.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: FnOnce(&Helpers) -> Language,
    {
        let language = factory(&Helpers);
        self.register_language(name, &language)
    }

    /// Register an already built grammar
    pub fn register_language(&mut self, name: &str, language: &Language) -> Result<()> {
        let key = name.to_lowercase();
        let compiled = CompiledLanguage::compile(language, name).map_err(|e| {
            tracing::error!("Language definition for '{}' could not be registered: {}", name, e);
            e
        })?;

        self.aliases.retain(|_, target| *target != key);
        for alias in compiled.aliases() {
            self.aliases.insert(alias.to_lowercase(), key.clone());
        }
        if !self.languages.contains_key(&key) {
            self.order.push(key.clone());
        }
        tracing::debug!(
            "Registered language '{}' ({} modes)",
            key,
            compiled.mode_count()
        );
        self.languages.insert(key, Arc::new(compiled));
        Ok(())
    }

    /// Remove a grammar and every alias pointing at it
    pub fn unregister(&mut self, name: &str) -> bool {
        let key = name.to_lowercase();
        if self.languages.remove(&key).is_none() {
            return false;
        }
        self.order.retain(|n| *n != key);
        self.aliases.retain(|_, target| *target != key);
        tracing::debug!("Unregistered language '{}'", key);
        true
    }

    /// Point extra aliases at a registered name
    pub fn register_aliases<I, S>(&mut self, aliases: I, name: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = name.to_lowercase();
        for alias in aliases {
            self.aliases.insert(alias.as_ref().to_lowercase(), key.clone());
        }
    }

    /// Registered name for a name or alias
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.resolve(name).map(|(key, _)| key)
    }

    /// Look a grammar up by name or alias
    pub fn get(&self, name: &str) -> Option<&Arc<CompiledLanguage>> {
        let key = name.to_lowercase();
        self.languages.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|target| self.languages.get(target))
        })
    }

    /// Registered name and grammar for a name or alias
    pub fn resolve(&self, name: &str) -> Option<(&str, &CompiledLanguage)> {
        let key = name.to_lowercase();
        let key = if self.languages.contains_key(&key) {
            key
        } else {
            self.aliases.get(&key)?.clone()
        };
        self.languages
            .get_key_value(&key)
            .map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Whether the grammar exists and takes part in auto-detection
    pub fn auto_detection(&self, name: &str) -> bool {
        self.get(name).is_some_and(|l| !l.disable_autodetect())
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
