//! Bundled grammars
//!
//! A small set of grammars that ship with the crate, registered together by
//! [`register_builtin`]. Each grammar is a factory taking the shared
//! [`Helpers`](crate::grammar::helpers::Helpers), exactly like user grammars.

mod bash;
mod ini;
mod json;
mod xml;

use crate::error::Result;
use crate::grammar::Language;
use crate::registry::LanguageRegistry;

/// Names of the bundled grammars, in registration order
pub const BUILTIN_LANGUAGES: &[&str] = &["plaintext", "json", "ini", "bash", "xml"];

/// Register every bundled grammar into `registry`
pub fn register_builtin(registry: &mut LanguageRegistry) -> Result<()> {
    registry.register("plaintext", |_| Language::plaintext().aliases(["text", "txt"]))?;
    registry.register("json", json::language)?;
    registry.register("ini", ini::language)?;
    registry.register("bash", bash::language)?;
    registry.register("xml", xml::language)?;
    tracing::debug!("Registered {} bundled languages", BUILTIN_LANGUAGES.len());
    Ok(())
}
