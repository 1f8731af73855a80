//! Shared regex fragments and common modes for grammar authors
//!
//! Every function returns a fresh [`Mode`], so a grammar can tweak what it
//! gets without affecting other grammars. [`Helpers`] is the handle passed to
//! grammar factories on registration; it exposes the same items as methods.

use crate::compiler::patterns;

use super::{MatchDecision, Mode};

/// Matches nothing, ever
pub const MATCH_NOTHING_RE: &str = r"\b\B";
pub const IDENT_RE: &str = r"[a-zA-Z]\w*";
pub const UNDERSCORE_IDENT_RE: &str = r"[a-zA-Z_]\w*";
pub const NUMBER_RE: &str = r"\b\d+(\.\d+)?";
/// 0x..., 0..., decimal, float
pub const C_NUMBER_RE: &str = r"(-?)(\b0[xX][a-fA-F0-9]+|(\b\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?)";
pub const BINARY_NUMBER_RE: &str = r"\b(0b[01]+)";
/// Tokens after which a `/` starts a regex literal rather than a division
pub const RE_STARTERS_RE: &str = r"!|!=|!==|%|%=|&|&&|&=|\*|\*=|\+|\+=|,|-|-=|/=|/|:|;|<<|<<=|<=|<|===|==|=|>>>=|>>=|>=|>>>|>>|>|\?|\[|\{|\(|\^|\^=|\||\|=|\|\||~";

const SHEBANG_RE: &str = r"^#![ ]*/";
const DOCTAG_RE: &str = "(?:TODO|FIXME|NOTE|BUG|OPTIMIZE|HACK|XXX):";
const PHRASAL_WORDS_RE: &str = r"\b(a|an|the|are|I'm|isn't|don't|doesn't|won't|but|just|should|pretty|simply|enough|gonna|going|wtf|so|such|will|you|your|they|like|more)\b";
const CSS_UNITS: &str = "(%|em|ex|ch|rem|vw|vh|vmin|vmax|cm|mm|in|pt|pc|px|deg|grad|rad|turn|s|ms|Hz|kHz|dpi|dpcm|dppx)?";
const BEGIN_MATCH_KEY: &str = "_beginMatch";

pub use patterns::{concat, either, escape};

/// `#!/usr/bin/env ...` on the very first line, optionally for one binary
pub fn shebang(binary: Option<&str>) -> Mode {
    let begin = match binary {
        Some(binary) => concat(&[SHEBANG_RE, r".*\b", binary, r"\b.*"]),
        None => SHEBANG_RE.to_string(),
    };
    Mode::new()
        .class_name("meta")
        .begin(begin)
        .end("$")
        .relevance(0)
        .on_begin(|m, _| {
            if m.index() != 0 {
                MatchDecision::Reject
            } else {
                MatchDecision::Accept
            }
        })
}

pub fn backslash_escape() -> Mode {
    Mode::new().begin(r"\\[\s\S]").relevance(0)
}

pub fn apos_string_mode() -> Mode {
    Mode::new()
        .class_name("string")
        .begin("'")
        .end("'")
        .illegal(r"\n")
        .contain(backslash_escape())
}

pub fn quote_string_mode() -> Mode {
    Mode::new()
        .class_name("string")
        .begin("\"")
        .end("\"")
        .illegal(r"\n")
        .contain(backslash_escape())
}

/// Common English words, so prose in comments does not look like code
pub fn phrasal_words_mode() -> Mode {
    Mode::new().begin(PHRASAL_WORDS_RE)
}

/// A comment delimited by `begin`/`end`; `overrides` is merged on top.
/// Phrasal words and doc tags (`TODO:`, `FIXME:`, ...) are always recognised.
pub fn comment(begin: &str, end: &str, overrides: Mode) -> Mode {
    let base = Mode::new()
        .class_name("comment")
        .begin(begin)
        .end(end)
        .contains(Vec::<Mode>::new());
    base.merge(&overrides)
        .contain(phrasal_words_mode())
        .contain(Mode::new().class_name("doctag").begin(DOCTAG_RE).relevance(0))
}

pub fn c_line_comment_mode() -> Mode {
    comment("//", "$", Mode::new())
}

pub fn c_block_comment_mode() -> Mode {
    comment(r"/\*", r"\*/", Mode::new())
}

pub fn hash_comment_mode() -> Mode {
    comment("#", "$", Mode::new())
}

pub fn number_mode() -> Mode {
    Mode::new().class_name("number").begin(NUMBER_RE).relevance(0)
}

pub fn c_number_mode() -> Mode {
    Mode::new().class_name("number").begin(C_NUMBER_RE).relevance(0)
}

pub fn binary_number_mode() -> Mode {
    Mode::new().class_name("number").begin(BINARY_NUMBER_RE).relevance(0)
}

pub fn css_number_mode() -> Mode {
    Mode::new()
        .class_name("number")
        .begin(format!("{}{}", NUMBER_RE, CSS_UNITS))
        .relevance(0)
}

/// `/.../flags` regex literals; only entered when a closing `/` follows on the same line
pub fn regexp_mode() -> Mode {
    let class = Mode::new()
        .begin(r"\[")
        .end(r"\]")
        .relevance(0)
        .contain(backslash_escape());
    let literal = Mode::new()
        .class_name("regexp")
        .begin("/")
        .end("/[gimuy]*")
        .illegal(r"\n")
        .contain(backslash_escape())
        .contain(class);
    Mode::new().begin(r"(?=/[^/\n]*/)").contain(literal)
}

pub fn title_mode() -> Mode {
    Mode::new().class_name("title").begin(IDENT_RE).relevance(0)
}

pub fn underscore_title_mode() -> Mode {
    Mode::new()
        .class_name("title")
        .begin(UNDERSCORE_IDENT_RE)
        .relevance(0)
}

/// `.name` after an expression, so method names are not taken for keywords
pub fn method_guard() -> Mode {
    Mode::new()
        .begin(format!(r"\.\s*{}", UNDERSCORE_IDENT_RE))
        .relevance(0)
}

/// The mode only ends on the same text its first capture group matched on
/// begin (heredocs, raw strings with custom delimiters).
pub fn end_same_as_begin(mode: Mode) -> Mode {
    mode.on_begin(|m, data| {
        data.set(BEGIN_MATCH_KEY, m.group(1).unwrap_or_default());
        MatchDecision::Accept
    })
    .on_end(|m, data| {
        if data.get(BEGIN_MATCH_KEY) == Some(m.group(1).unwrap_or_default()) {
            MatchDecision::Accept
        } else {
            MatchDecision::Reject
        }
    })
}

/// Handle given to grammar factories
#[derive(Debug, Clone, Copy, Default)]
pub struct Helpers;

impl Helpers {
    pub fn match_nothing_re(&self) -> &'static str {
        MATCH_NOTHING_RE
    }
    pub fn ident_re(&self) -> &'static str {
        IDENT_RE
    }
    pub fn underscore_ident_re(&self) -> &'static str {
        UNDERSCORE_IDENT_RE
    }
    pub fn number_re(&self) -> &'static str {
        NUMBER_RE
    }
    pub fn c_number_re(&self) -> &'static str {
        C_NUMBER_RE
    }
    pub fn binary_number_re(&self) -> &'static str {
        BINARY_NUMBER_RE
    }
    pub fn re_starters_re(&self) -> &'static str {
        RE_STARTERS_RE
    }
    pub fn shebang(&self, binary: Option<&str>) -> Mode {
        shebang(binary)
    }
    pub fn backslash_escape(&self) -> Mode {
        backslash_escape()
    }
    pub fn apos_string_mode(&self) -> Mode {
        apos_string_mode()
    }
    pub fn quote_string_mode(&self) -> Mode {
        quote_string_mode()
    }
    pub fn phrasal_words_mode(&self) -> Mode {
        phrasal_words_mode()
    }
    pub fn comment(&self, begin: &str, end: &str, overrides: Mode) -> Mode {
        comment(begin, end, overrides)
    }
    pub fn c_line_comment_mode(&self) -> Mode {
        c_line_comment_mode()
    }
    pub fn c_block_comment_mode(&self) -> Mode {
        c_block_comment_mode()
    }
    pub fn hash_comment_mode(&self) -> Mode {
        hash_comment_mode()
    }
    pub fn number_mode(&self) -> Mode {
        number_mode()
    }
    pub fn c_number_mode(&self) -> Mode {
        c_number_mode()
    }
    pub fn binary_number_mode(&self) -> Mode {
        binary_number_mode()
    }
    pub fn css_number_mode(&self) -> Mode {
        css_number_mode()
    }
    pub fn regexp_mode(&self) -> Mode {
        regexp_mode()
    }
    pub fn title_mode(&self) -> Mode {
        title_mode()
    }
    pub fn underscore_title_mode(&self) -> Mode {
        underscore_title_mode()
    }
    pub fn method_guard(&self) -> Mode {
        method_guard()
    }
    pub fn end_same_as_begin(&self, mode: Mode) -> Mode {
        end_same_as_begin(mode)
    }
    pub fn escape(&self, literal: &str) -> String {
        escape(literal)
    }
    pub fn concat(&self, parts: &[&str]) -> String {
        concat(parts)
    }
    pub fn either(&self, parts: &[&str]) -> String {
        either(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_keeps_override_children_and_appends_defaults() {
        let c = comment("--", "$", Mode::new().relevance(0).contain(Mode::new().begin("x")));
        let contains = c.contains.as_ref().unwrap();
        assert_eq!(contains.len(), 3);
        assert_eq!(c.class_name.as_deref(), Some("comment"));
        assert_eq!(c.relevance, Some(0));
        assert_eq!(c.begin.as_deref(), Some("--"));
    }

    #[test]
    fn test_shebang_with_binary() {
        let m = shebang(Some("node"));
        assert!(m.begin.as_deref().unwrap().contains("node"));
        assert!(m.on_begin.is_some());
    }

    #[test]
    fn test_end_same_as_begin_installs_both_guards() {
        let m = end_same_as_begin(Mode::new().begin("(\\w+)").end("(\\w+)"));
        assert!(m.on_begin.is_some());
        assert!(m.on_end.is_some());
    }
}
