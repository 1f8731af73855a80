//! INI files and TOML

use crate::grammar::helpers::{concat, either, Helpers};
use crate::grammar::{Language, Mode};

const BARE_KEY: &str = r"[A-Za-z0-9_-]+";
const QUOTED_KEY_DOUBLE: &str = r#""(\\"|[^"])*""#;
const QUOTED_KEY_SINGLE: &str = r"'[^']*'";

pub(super) fn language(h: &Helpers) -> Language {
    let numbers = Mode::new()
        .class_name("number")
        .relevance(0)
        .variants([
            Mode::new().begin(r"([+-]+)?[\d]+_[\d_]+"),
            Mode::new().begin(h.number_re()),
        ]);

    let comments = h
        .comment(";", "$", Mode::new())
        .variants([Mode::new().begin(";").end("$"), Mode::new().begin("#").end("$")])
        .into_ref();

    let variables = Mode::new().class_name("variable").variants([
        Mode::new().begin(r#"\$[\w\d"][\w\d_]*"#),
        Mode::new().begin(r"\$\{(.*?)\}"),
    ]);

    let literals = Mode::new()
        .class_name("literal")
        .begin(r"\b(?:on|off|true|false|yes|no)\b");

    let strings = Mode::new()
        .class_name("string")
        .contain(h.backslash_escape())
        .variants([
            Mode::new().begin("'''").end("'''").relevance(10),
            Mode::new().begin("\"\"\"").end("\"\"\"").relevance(10),
            Mode::new().begin("\"").end("\""),
            Mode::new().begin("'").end("'"),
        ]);

    let array = Mode::new()
        .begin(r"\[")
        .end(r"\]")
        .relevance(0)
        .contain(&comments)
        .contain(literals.clone())
        .contain(variables.clone())
        .contain(strings.clone())
        .contain(numbers.clone())
        .contain_self();

    let any_key = either(&[BARE_KEY, QUOTED_KEY_DOUBLE, QUOTED_KEY_SINGLE]);
    let dotted_key = concat(&[&any_key, r"(\s*\.\s*", &any_key, r")*", r"(?=\s*=\s*[^#\s])"]);

    let value = Mode::new()
        .end("$")
        .contain(&comments)
        .contain(array)
        .contain(literals)
        .contain(variables)
        .contain(strings)
        .contain(numbers);

    Language::new("TOML, also INI")
        .alias("toml")
        .case_insensitive()
        .illegal(r"\S")
        .contain(&comments)
        .contain(Mode::new().class_name("section").begin(r"\[+").end(r"\]+"))
        .contain(Mode::new().class_name("attr").begin(dotted_key).starts(value))
}

#[cfg(test)]
mod tests {
    use crate::config::HighlightConfig;
    use crate::emitter::TokenTree;
    use crate::registry::LanguageRegistry;
    use crate::tokenizer::{self, HighlightResult};

    fn highlight(code: &str) -> HighlightResult<TokenTree> {
        let mut registry = LanguageRegistry::new();
        registry.register("ini", super::language).unwrap();
        tokenizer::highlight(&registry, &HighlightConfig::default(), "ini", code, false, None).unwrap()
    }

    #[test]
    fn test_section_and_key() {
        let result = highlight("[core]\nname = on");
        assert_eq!(
            result.value,
            concat!(
                r#"<span class="hljs-section">[core]</span>"#,
                "\n",
                r#"<span class="hljs-attr">name</span> = <span class="hljs-literal">on</span>"#
            )
        );
    }

    #[test]
    fn test_comment_variants() {
        let result = highlight("; one\n# two");
        assert_eq!(
            result.value,
            "<span class=\"hljs-comment\">; one</span>\n<span class=\"hljs-comment\"># two</span>"
        );
    }

    #[test]
    fn test_triple_quoted_string_is_relevant() {
        let result = highlight("a = '''x'''");
        assert!(result.value.contains(r#"<span class="hljs-string">&#x27;&#x27;&#x27;x&#x27;&#x27;&#x27;</span>"#));
        assert!(result.relevance >= 10);
    }
}
