//! XML and HTML

use crate::grammar::helpers::{concat, either, Helpers};
use crate::grammar::{Keywords, Language, Mode};

const XML_IDENT_RE: &str = r"[A-Z_a-z:][A-Z_a-z0-9:.-]*";
const TAG_NAME_RE: &str = r"[A-Za-z0-9._:-]+";

pub(super) fn language(h: &Helpers) -> Language {
    let entities = Mode::new()
        .class_name("symbol")
        .begin(r"&[a-z]+;|&#[0-9]+;|&#x[a-f0-9]+;")
        .into_ref();

    let meta_keywords = Mode::new()
        .begin(r"\s")
        .contain(Mode::new().class_name("meta-keyword").begin(r"#?[a-z_][a-z1-9_-]+").illegal(r"\n"));
    let meta_par_keywords = meta_keywords.clone().begin(r"\(").end(r"\)");
    let apos_meta_string = h.apos_string_mode().class_name("meta-string");
    let quote_meta_string = h.quote_string_mode().class_name("meta-string");

    let tag_internals = Mode::new()
        .ends_with_parent()
        .illegal("<")
        .relevance(0)
        .contain(Mode::new().class_name("attr").begin(XML_IDENT_RE).relevance(0))
        .contain(
            Mode::new().begin(r"=\s*").relevance(0).contain(
                Mode::new().class_name("string").ends_parent().variants([
                    Mode::new().begin("\"").end("\"").contain(&entities),
                    Mode::new().begin("'").end("'").contain(&entities),
                    Mode::new().begin(r#"[^\s"'=<>`]+"#),
                ]),
            ),
        )
        .into_ref();

    let doctype = Mode::new()
        .class_name("meta")
        .begin(r"<![a-z]")
        .end(">")
        .relevance(10)
        .contain(meta_keywords.clone())
        .contain(quote_meta_string.clone())
        .contain(apos_meta_string.clone())
        .contain(meta_par_keywords.clone())
        .contain(
            Mode::new().begin(r"\[").end(r"\]").contain(
                Mode::new()
                    .class_name("meta")
                    .begin(r"<![a-z]")
                    .end(">")
                    .contain(meta_keywords)
                    .contain(meta_par_keywords)
                    .contain(quote_meta_string)
                    .contain(apos_meta_string),
            ),
        );

    let embedded = |tag: &str, languages: &[&str]| {
        Mode::new()
            .class_name("tag")
            .begin(format!(r"<{}(?=\s|>)", tag))
            .end(">")
            .keywords(Keywords::new().category("name", tag))
            .contain(&tag_internals)
            .starts(
                Mode::new()
                    .end(format!(r"</{}>", tag))
                    .return_end()
                    .sub_language_any(languages.iter().copied()),
            )
    };

    let open_tag = Mode::new()
        .class_name("tag")
        .begin(concat(&["<", "(?=", TAG_NAME_RE, &either(&[r"/>", ">", r"\s"]), ")"]))
        .end(r"/?>")
        .contain(
            Mode::new()
                .class_name("name")
                .begin(TAG_NAME_RE)
                .relevance(0)
                .starts(tag_internals.clone()),
        );

    let close_tag = Mode::new()
        .class_name("tag")
        .begin(concat(&["</", "(?=", TAG_NAME_RE, ">)"]))
        .contain(Mode::new().class_name("name").begin(TAG_NAME_RE).relevance(0))
        .contain(Mode::new().begin(">").relevance(0).ends_parent());

    Language::new("HTML, XML")
        .aliases(["html", "xhtml", "rss", "atom", "xjb", "xsd", "xsl", "plist", "wsf", "svg"])
        .case_insensitive()
        .contain(doctype)
        .contain(h.comment("<!--", "-->", Mode::new().relevance(10)))
        .contain(Mode::new().begin(r"<!\[CDATA\[").end(r"\]\]>").relevance(10))
        .contain(&entities)
        .contain(Mode::new().class_name("meta").begin(r"<\?xml").end(r"\?>").relevance(10))
        .contain(embedded("style", &["css", "xml"]))
        .contain(embedded("script", &["javascript", "xml"]))
        .contain(Mode::new().class_name("tag").begin("<>|</>"))
        .contain(open_tag)
        .contain(close_tag)
}
