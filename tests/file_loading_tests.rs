//! Loading configuration and grammar documents from disk

mod common;

use common::tracing::init_tracing_from_env;
use fresh_highlight::{HighlightConfig, HighlightOptions, Highlighter, Language};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_file_with_camel_case_and_unknown_keys() {
    init_tracing_from_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("highlight.json");
    fs::write(
        &path,
        r#"{"classPrefix": "code-", "tabReplace": "  ", "safeMode": false, "noHighlightRe": "^no$"}"#,
    )
    .unwrap();

    let config = HighlightConfig::from_file(&path).unwrap();
    assert_eq!(config.class_prefix, "code-");
    assert_eq!(config.tab_replace.as_deref(), Some("  "));
    assert!(!config.safe_mode);
    assert!(!config.use_line_breaks_as_element);
}

#[test]
fn test_missing_config_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");
    let err = HighlightConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_malformed_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"useBR": 3}"#).unwrap();
    assert!(HighlightConfig::from_file(&path).is_err());
}

#[test]
fn test_grammar_file_registration() {
    init_tracing_from_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("demo.json");
    fs::write(
        &path,
        r#"{
            "name": "Demo",
            "aliases": ["dmo"],
            "keywords": {"keyword": "if then", "literal": ["nil"]},
            "contains": [
                {"className": "string", "begin": "\"", "end": "\"", "relevance": 0},
                {"className": "block", "begin": "\\(", "end": "\\)", "contains": ["self"]}
            ]
        }"#,
    )
    .unwrap();

    let mut highlighter = Highlighter::new();
    highlighter.register_language_file("demo", &path).unwrap();
    let result = highlighter
        .highlight("if (nil (x))", "dmo", HighlightOptions::default())
        .unwrap();
    insta::assert_snapshot!(
        result.value,
        @r#"<span class="hljs-keyword">if</span> <span class="hljs-block">(nil <span class="hljs-block">(x)</span>)</span>"#
    );
}

#[test]
fn test_grammar_file_with_top_level_self_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"name": "Bad", "contains": ["self"]}"#).unwrap();

    let language = Language::from_file(&path).unwrap();
    let mut highlighter = Highlighter::new();
    assert!(highlighter.register_language_file("bad", &path).is_err());
    assert!(highlighter.list_languages().is_empty());
    assert_eq!(language.name.as_deref(), Some("Bad"));
}
