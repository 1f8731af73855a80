//! Generic token tree

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::html::escape_html;
use super::Emitter;
use crate::config::HighlightConfig;

/// A leaf of text or a tagged node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Text(String),
    Node(TokenNode),
}

/// A node of the token tree. The root has no category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Root of an embedded language's tree; `category` is then the language name
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sublanguage: bool,
    #[serde(default)]
    pub children: Vec<Token>,
}

impl TokenNode {
    pub fn new(category: Option<String>) -> Self {
        Self {
            category,
            sublanguage: false,
            children: Vec::new(),
        }
    }

    /// Append text, merging it into a trailing text leaf
    fn push_text(&mut self, text: &str) {
        if let Some(Token::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Token::Text(text.to_string()));
        }
    }

    /// Concatenation of every text leaf in document order
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Token::Text(text) => out.push_str(text),
                Token::Node(node) => node.collect_text(out),
            }
        }
    }

    /// Merge runs of adjacent text leaves, recursively
    pub fn collapse(&mut self) {
        let children = std::mem::take(&mut self.children);
        for child in children {
            match child {
                Token::Text(text) => self.push_text(&text),
                Token::Node(mut node) => {
                    node.collapse();
                    self.children.push(Token::Node(node));
                }
            }
        }
    }

    /// Render as HTML spans; sub-language roots use the bare language name as class
    pub fn render_html(&self, class_prefix: &str) -> String {
        let mut out = String::new();
        self.write_html(class_prefix, &mut out);
        out
    }

    fn write_html(&self, class_prefix: &str, out: &mut String) {
        let class = self.css_class(class_prefix);
        if let Some(class) = &class {
            out.push_str("<span class=\"");
            out.push_str(class);
            out.push_str("\">");
        }
        for child in &self.children {
            match child {
                Token::Text(text) => out.push_str(&escape_html(text)),
                Token::Node(node) => node.write_html(class_prefix, out),
            }
        }
        if class.is_some() {
            out.push_str("</span>");
        }
    }

    fn css_class(&self, class_prefix: &str) -> Option<String> {
        let kind = self.category.as_deref()?;
        if self.sublanguage {
            Some(kind.to_string())
        } else {
            Some(format!("{}{}", class_prefix, kind))
        }
    }

    /// Children in the HAST shape (`element` spans and `text` values).
    /// Untagged nodes contribute their children directly.
    fn hast_children(&self, class_prefix: &str) -> Vec<Value> {
        let mut out = Vec::new();
        for child in &self.children {
            match child {
                Token::Text(text) => out.push(json!({ "type": "text", "value": text })),
                Token::Node(node) => match node.css_class(class_prefix) {
                    Some(class) => out.push(json!({
                        "type": "element",
                        "tagName": "span",
                        "properties": { "className": [class] },
                        "children": node.hast_children(class_prefix),
                    })),
                    None => out.extend(node.hast_children(class_prefix)),
                },
            }
        }
        out
    }
}

/// Emitter that keeps the whole tree
#[derive(Debug, Clone)]
pub struct TokenTree {
    /// Open nodes; the root is always at the bottom
    stack: Vec<TokenNode>,
    class_prefix: String,
}

impl TokenTree {
    pub fn with_prefix(class_prefix: impl Into<String>) -> Self {
        Self {
            stack: vec![TokenNode::default()],
            class_prefix: class_prefix.into(),
        }
    }

    fn top(&mut self) -> &mut TokenNode {
        if self.stack.is_empty() {
            self.stack.push(TokenNode::default());
        }
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// The root node; nodes still open are not attached yet
    pub fn root(&self) -> &TokenNode {
        &self.stack[0]
    }

    /// Close everything and take the root
    pub fn into_root(mut self) -> TokenNode {
        self.close_all_nodes();
        self.stack.pop().unwrap_or_default()
    }

    /// Top-level tokens
    pub fn tokens(&self) -> &[Token] {
        &self.root().children
    }

    /// Concatenated text of the closed tree
    pub fn text(&self) -> String {
        self.root().text()
    }

    pub fn class_prefix(&self) -> &str {
        &self.class_prefix
    }

    /// Pretty JSON of the tree: `{category?, children: [text | node]}`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self.root())
    }

    /// The tree in HAST form, as produced for virtual-DOM renderers
    pub fn to_hast(&self) -> Value {
        json!({
            "type": "root",
            "children": self.root().hast_children(&self.class_prefix),
        })
    }
}

impl Default for TokenTree {
    fn default() -> Self {
        Self::new(&HighlightConfig::default())
    }
}

impl Emitter for TokenTree {
    fn new(config: &HighlightConfig) -> Self {
        Self::with_prefix(config.class_prefix.clone())
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.top().push_text(text);
    }

    fn open_node(&mut self, kind: &str) {
        self.stack.push(TokenNode::new(Some(kind.to_string())));
    }

    fn close_node(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(node) = self.stack.pop() {
            self.top().children.push(Token::Node(node));
        }
    }

    fn close_all_nodes(&mut self) {
        while self.stack.len() > 1 {
            self.close_node();
        }
    }

    fn add_sublanguage(&mut self, sub: Self, name: Option<&str>) {
        let mut root = sub.into_root();
        root.category = name.map(str::to_string);
        root.sublanguage = true;
        self.top().children.push(Token::Node(root));
    }

    fn finalize(&mut self) {
        self.close_all_nodes();
        self.top().collapse();
    }

    fn to_html(&self) -> String {
        self.root().render_html(&self.class_prefix)
    }
}
