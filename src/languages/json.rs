//! JSON, with `//` and `/* */` comments tolerated

use crate::grammar::helpers::Helpers;
use crate::grammar::{Keywords, Language, LateMode, Mode, ModeRef};

pub(super) fn language(h: &Helpers) -> Language {
    let literals = || Keywords::new().category("literal", "true false null");
    let object = LateMode::new();
    let array = LateMode::new();

    let string = h.quote_string_mode().into_ref();
    let number = h.c_number_mode().into_ref();
    let line_comment = h.c_line_comment_mode().into_ref();
    let block_comment = h.c_block_comment_mode().into_ref();
    let values: Vec<ModeRef> = vec![
        (&string).into(),
        (&number).into(),
        (&object).into(),
        (&array).into(),
        (&line_comment).into(),
        (&block_comment).into(),
    ];

    // a value runs up to the next comma or the end of its container
    let value = Mode::new()
        .end(",")
        .ends_with_parent()
        .exclude_end()
        .keywords(literals())
        .contains(values.clone());

    let key = Mode::new()
        .class_name("attr")
        .begin("\"")
        .end("\"")
        .illegal(r"\n")
        .contain(h.backslash_escape());

    object.set(
        Mode::new()
            .begin(r"\{")
            .end(r"\}")
            .illegal(r"\S")
            .contain(key)
            .contain(value.clone().begin(":"))
            .contain(&line_comment)
            .contain(&block_comment),
    );
    array.set(Mode::new().begin(r"\[").end(r"\]").illegal(r"\S").contain(value));

    Language::new("JSON")
        .keywords(literals())
        .illegal(r"\S")
        .contains(values)
}
