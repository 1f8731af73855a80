//! Bundled grammars, used through the facade

mod common;

use common::tracing::init_tracing_from_env;
use fresh_highlight::{HighlightOptions, Highlighter};
use std::path::Path;

fn highlighter() -> Highlighter {
    init_tracing_from_env();
    Highlighter::with_builtin_languages().unwrap()
}

#[test]
fn test_builtin_names_and_aliases() {
    let highlighter = highlighter();
    assert_eq!(highlighter.list_languages(), vec!["plaintext", "json", "ini", "bash", "xml"]);
    assert_eq!(highlighter.get_language("toml").unwrap().name(), "TOML, also INI");
    assert_eq!(highlighter.get_language("HTML").unwrap().name(), "HTML, XML");
    assert_eq!(highlighter.language_for_path(Path::new("build.sh")), Some("bash"));
    assert_eq!(highlighter.language_for_path(Path::new("Cargo.toml")), Some("ini"));
    assert_eq!(highlighter.language_for_path(Path::new("index.html")), Some("xml"));
}

#[test]
fn test_plaintext_highlights_nothing() {
    let highlighter = highlighter();
    let result = highlighter
        .highlight("if <x> then", "text", HighlightOptions::default())
        .unwrap();
    assert_eq!(result.value, "if &lt;x&gt; then");
    assert_eq!(result.relevance, 0);
}

#[test]
fn test_json_document() {
    let highlighter = highlighter();
    let result = highlighter
        .highlight(r#"{"a": [1, true]}"#, "json", HighlightOptions::default())
        .unwrap();
    insta::assert_snapshot!(
        result.value,
        @r#"{<span class="hljs-attr">&quot;a&quot;</span>: [<span class="hljs-number">1</span>, <span class="hljs-literal">true</span>]}"#
    );
}

#[test]
fn test_detects_json() {
    let highlighter = highlighter();
    let result = highlighter
        .highlight_auto(r#"{"name": "fresh", "tags": [true, false, null]}"#, None)
        .unwrap();
    assert_eq!(result.language.as_deref(), Some("json"));
}

#[test]
fn test_detects_bash_from_shebang() {
    let highlighter = highlighter();
    let result = highlighter
        .highlight_auto("#!/bin/bash\necho \"$HOME\"\n", None)
        .unwrap();
    assert_eq!(result.language.as_deref(), Some("bash"));
}

#[test]
fn test_detects_markup() {
    let highlighter = highlighter();
    let result = highlighter
        .highlight_auto("<!DOCTYPE html>\n<p class=\"x\">hi</p>", None)
        .unwrap();
    assert_eq!(result.language.as_deref(), Some("xml"));
}

#[test]
fn test_toml_tables() {
    let highlighter = highlighter();
    let result = highlighter
        .highlight("[package]\nname = \"fresh\"", "toml", HighlightOptions::default())
        .unwrap();
    assert_eq!(result.language.as_deref(), Some("ini"));
    assert_eq!(
        result.value,
        concat!(
            r#"<span class="hljs-section">[package]</span>"#,
            "\n",
            r#"<span class="hljs-attr">name</span> = <span class="hljs-string">&quot;fresh&quot;</span>"#
        )
    );
}
