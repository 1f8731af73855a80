//! Direct HTML output

use super::Emitter;
use crate::config::HighlightConfig;

const SPAN_CLOSE: &str = "</span>";

/// Escape `& < > " '` for use in HTML text and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Emitter that serializes straight into a markup buffer
#[derive(Debug, Clone, Default)]
pub struct HtmlEmitter {
    buffer: String,
    class_prefix: String,
    open: usize,
}

impl HtmlEmitter {
    pub fn with_prefix(class_prefix: impl Into<String>) -> Self {
        Self {
            class_prefix: class_prefix.into(),
            ..Default::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(mut self) -> String {
        self.close_all_nodes();
        self.buffer
    }
}

impl Emitter for HtmlEmitter {
    fn new(config: &HighlightConfig) -> Self {
        Self::with_prefix(config.class_prefix.clone())
    }

    fn add_text(&mut self, text: &str) {
        self.buffer.push_str(&escape_html(text));
    }

    fn open_node(&mut self, kind: &str) {
        self.buffer.push_str("<span class=\"");
        self.buffer.push_str(&self.class_prefix);
        self.buffer.push_str(kind);
        self.buffer.push_str("\">");
        self.open += 1;
    }

    fn close_node(&mut self) {
        if self.open == 0 {
            return;
        }
        self.buffer.push_str(SPAN_CLOSE);
        self.open -= 1;
    }

    fn close_all_nodes(&mut self) {
        while self.open > 0 {
            self.close_node();
        }
    }

    fn add_sublanguage(&mut self, sub: Self, name: Option<&str>) {
        let inner = sub.into_string();
        match name {
            Some(name) => {
                self.buffer.push_str("<span class=\"");
                self.buffer.push_str(name);
                self.buffer.push_str("\">");
                self.buffer.push_str(&inner);
                self.buffer.push_str(SPAN_CLOSE);
            }
            None => self.buffer.push_str(&inner),
        }
    }

    fn finalize(&mut self) {
        self.close_all_nodes();
    }

    fn to_html(&self) -> String {
        self.buffer.clone()
    }
}
