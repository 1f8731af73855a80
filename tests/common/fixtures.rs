//! Grammars shared by the integration tests

use fresh_highlight::{Helpers, Highlighter, Language, Mode};

/// `if` weighs 1, `then` weighs 0, strings weigh nothing
pub fn mini(_: &Helpers) -> Language {
    Language::new("Mini")
        .keywords("if|1 then|0")
        .contain(Mode::new().class_name("string").begin("\"").end("\"").relevance(0))
}

/// Brace blocks nesting inside themselves
pub fn blocks(h: &Helpers) -> Language {
    Language::new("Blocks")
        .alias("blk")
        .keywords("fn let")
        .contain(h.c_line_comment_mode())
        .contain(
            Mode::new()
                .class_name("block")
                .begin(r"\{")
                .end(r"\}")
                .keywords("fn let")
                .contain_self(),
        )
}

/// Markup whose `{{ ... }}` holes are highlighted as `blocks`
pub fn template(_: &Helpers) -> Language {
    Language::new("Template")
        .disable_autodetect()
        .contain(Mode::new().class_name("comment").begin("<#").end("#>"))
        .contain(
            Mode::new()
                .begin(r"\{\{")
                .end(r"\}\}")
                .exclude_begin()
                .exclude_end()
                .sub_language("blocks"),
        )
}

/// A highlighter with every fixture grammar registered
pub fn highlighter() -> Highlighter {
    let mut highlighter = Highlighter::new();
    highlighter.register_language("mini", mini).unwrap();
    highlighter.register_language("blocks", blocks).unwrap();
    highlighter.register_language("template", template).unwrap();
    highlighter
}
