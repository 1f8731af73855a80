//! End-to-end highlighting through the public facade

mod common;

use common::fixtures;
use common::tracing::init_tracing_from_env;
use fresh_highlight::{
    HighlightError, HighlightOptions, HtmlEmitter, Language, Mode, PartialHighlightConfig, Token, TokenNode,
};

fn node(category: &str, children: Vec<Token>) -> Token {
    Token::Node(TokenNode {
        category: Some(category.to_string()),
        sublanguage: false,
        children,
    })
}

fn text(s: &str) -> Token {
    Token::Text(s.to_string())
}

#[test]
fn test_keyword_string_keyword_tree() {
    init_tracing_from_env();
    let highlighter = fixtures::highlighter();
    let result = highlighter
        .highlight(r#"if "x" then"#, "mini", HighlightOptions::default())
        .unwrap();

    assert_eq!(
        result.tree().tokens(),
        &[
            node("keyword", vec![text("if")]),
            text(" "),
            node("string", vec![text(r#""x""#)]),
            text(" "),
            node("keyword", vec![text("then")]),
        ]
    );
    assert_eq!(result.relevance, 1);
    insta::assert_snapshot!(
        result.value,
        @r#"<span class="hljs-keyword">if</span> <span class="hljs-string">&quot;x&quot;</span> <span class="hljs-keyword">then</span>"#
    );
}

#[test]
fn test_self_nesting_blocks() {
    init_tracing_from_env();
    let highlighter = fixtures::highlighter();
    let result = highlighter
        .highlight("{ fn { let } }", "blk", HighlightOptions::default())
        .unwrap();
    assert_eq!(result.language.as_deref(), Some("blocks"));
    insta::assert_snapshot!(
        result.value,
        @r#"<span class="hljs-block">{ <span class="hljs-keyword">fn</span> <span class="hljs-block">{ <span class="hljs-keyword">let</span> }</span> }</span>"#
    );
    assert_eq!(result.relevance, 4);
}

#[test]
fn test_html_emitter_agrees_with_tree() {
    let highlighter = fixtures::highlighter();
    let code = "{ fn } // done\nlet";
    let tree = highlighter.highlight(code, "blocks", HighlightOptions::default()).unwrap();
    let html = highlighter
        .highlight_with::<HtmlEmitter>(code, "blocks", HighlightOptions::default())
        .unwrap();
    assert_eq!(tree.value, html.value);
    assert_eq!(tree.relevance, html.relevance);
    assert_eq!(html.emitter.as_str(), html.value);
}

#[test]
fn test_sub_language_hole() {
    init_tracing_from_env();
    let highlighter = fixtures::highlighter();
    let result = highlighter
        .highlight("a {{fn}} b", "template", HighlightOptions::default())
        .unwrap();
    insta::assert_snapshot!(
        result.value,
        @r#"a {{<span class="blocks"><span class="hljs-keyword">fn</span></span>}} b"#
    );
    assert_eq!(result.tree().text(), "a {{fn}} b");
}

#[test]
fn test_continuation_resumes_open_modes() {
    let highlighter = fixtures::highlighter();
    let first = highlighter
        .highlight("{ fn", "blocks", HighlightOptions::default())
        .unwrap();
    let stack = first.top.as_ref().unwrap();
    assert_eq!(stack.depth(), 2);

    let second = highlighter
        .highlight(" let }", "blocks", HighlightOptions::default().continue_from(stack))
        .unwrap();
    assert_eq!(
        second.value,
        r#"<span class="hljs-block"> <span class="hljs-keyword">let</span> }</span>"#
    );
    assert_eq!(second.top.unwrap().depth(), 1);
}

#[test]
fn test_illegal_is_fatal_unless_lenient() {
    let mut highlighter = fixtures::highlighter();
    highlighter
        .register_language("strict", |h| {
            Language::new("Strict")
                .keywords("let")
                .contain(h.quote_string_mode())
                .illegal("@")
        })
        .unwrap();

    let err = highlighter
        .highlight("let x @ y", "strict", HighlightOptions::default())
        .unwrap_err();
    match err {
        HighlightError::IllegalLexeme { lexeme, offset, .. } => {
            assert_eq!(lexeme, "@");
            assert_eq!(offset, 6);
        }
        other => panic!("expected illegal lexeme, got {:?}", other),
    }

    let result = highlighter
        .highlight("let x @ y", "strict", HighlightOptions::lenient())
        .unwrap();
    assert_eq!(result.value, r#"<span class="hljs-keyword">let</span> x @ y"#);
}

#[test]
fn test_class_prefix_and_markup_fixing() {
    let mut highlighter = fixtures::highlighter();
    highlighter.configure(PartialHighlightConfig {
        class_prefix: Some("hl-".into()),
        tab_replace: Some("  ".into()),
        use_line_breaks_as_element: Some(true),
        ..Default::default()
    });
    let result = highlighter
        .highlight("\tif\n\tthen", "mini", HighlightOptions::default())
        .unwrap();
    assert_eq!(
        highlighter.fix_markup(&result.value),
        r#"  <span class="hl-keyword">if</span><br>  <span class="hl-keyword">then</span>"#
    );
}

#[test]
fn test_unknown_language_is_an_error() {
    let highlighter = fixtures::highlighter();
    assert_eq!(
        highlighter
            .highlight("x", "cobol", HighlightOptions::default())
            .unwrap_err(),
        HighlightError::UnknownLanguage("cobol".into())
    );
}

#[test]
fn test_grammar_registration_errors_surface_immediately() {
    let mut highlighter = fixtures::highlighter();
    let err = highlighter
        .register_language("broken", |_| {
            Language::new("Broken").contain(Mode::new().begin("(unclosed"))
        })
        .unwrap_err();
    assert!(matches!(err, HighlightError::Configuration { .. }));
    assert!(highlighter.get_language("broken").is_none());
    assert_eq!(highlighter.list_languages(), vec!["mini", "blocks", "template"]);
}
