//! Token emitters
//!
//! The tokenizer reports what it finds as a stream of events: text, keyword,
//! open node, close node, and already-tokenized sub-language output. An
//! [`Emitter`] turns those events into output:
//! - [`TokenTree`] keeps a generic node tree for structured consumers
//! - [`HtmlEmitter`] writes escaped markup directly

mod html;
mod tree;

pub use html::{escape_html, HtmlEmitter};
pub use tree::{Token, TokenNode, TokenTree};

use crate::config::HighlightConfig;

/// Receiver of tokenizer events
///
/// `close_node` with only the root left open is a no-op, never an error:
/// modes still open at the end of input are closed by the tokenizer through
/// `close_all_nodes`.
pub trait Emitter: Sized {
    fn new(config: &HighlightConfig) -> Self;

    /// Plain text; empty text is ignored
    fn add_text(&mut self, text: &str);

    fn open_node(&mut self, kind: &str);

    fn close_node(&mut self);

    fn close_all_nodes(&mut self);

    /// Graft the output of a nested tokenization; `name` is the language it
    /// was tokenized as, if any
    fn add_sublanguage(&mut self, sub: Self, name: Option<&str>);

    fn finalize(&mut self);

    fn to_html(&self) -> String;

    /// A keyword is a node holding exactly its own text
    fn add_keyword(&mut self, text: &str, kind: &str) {
        if text.is_empty() {
            return;
        }
        self.open_node(kind);
        self.add_text(text);
        self.close_node();
    }
}
