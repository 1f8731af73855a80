//! Auto-detection through the public facade

mod common;

use common::fixtures;
use common::tracing::init_tracing_from_env;
use fresh_highlight::{HighlightConfig, Helpers, Highlighter, Keywords, Language, PartialHighlightConfig};

fn dialects(derived_first: bool) -> Highlighter {
    let mut highlighter = Highlighter::new();
    let base = |_: &Helpers| Language::new("Base").keywords("select from where");
    let derived = |_: &Helpers| {
        Language::new("Derived")
            .superset_of("base")
            .keywords("select from where")
    };
    if derived_first {
        highlighter.register_language("derived", derived).unwrap();
        highlighter.register_language("base", base).unwrap();
    } else {
        highlighter.register_language("base", base).unwrap();
        highlighter.register_language("derived", derived).unwrap();
    }
    highlighter
}

#[test]
fn test_best_and_second_best() {
    init_tracing_from_env();
    let highlighter = fixtures::highlighter();
    let result = highlighter.highlight_auto("{ fn } if", None).unwrap();
    assert_eq!(result.language.as_deref(), Some("blocks"));
    assert_eq!(result.relevance, 2);
    let second = result.second_best.unwrap();
    assert_eq!(second.language.as_deref(), Some("mini"));
    assert_eq!(second.relevance, 1);
}

#[test]
fn test_superset_wins_exact_tie_in_either_order() {
    for derived_first in [true, false] {
        let result = dialects(derived_first)
            .highlight_auto("select a from b", None)
            .unwrap();
        assert_eq!(result.language.as_deref(), Some("derived"));
        assert_eq!(result.relevance, 2);
        assert_eq!(result.second_best.unwrap().language.as_deref(), Some("base"));
    }
}

#[test]
fn test_superset_loses_when_base_scores_higher() {
    let mut highlighter = dialects(true);
    highlighter
        .register_language("base", |_| {
            Language::new("Base").keywords(Keywords::words("select|5 from where"))
        })
        .unwrap();
    let result = highlighter.highlight_auto("select a from b", None).unwrap();
    assert_eq!(result.language.as_deref(), Some("base"));
}

#[test]
fn test_nothing_matches_gives_plain_text() {
    let highlighter = fixtures::highlighter();
    let result = highlighter.highlight_auto("<plain & simple>", None).unwrap();
    assert_eq!(result.language, None);
    assert_eq!(result.relevance, 0);
    assert_eq!(result.value, "&lt;plain &amp; simple&gt;");
}

#[test]
fn test_subset_skips_unknown_names() {
    let highlighter = fixtures::highlighter();
    let subset = vec!["nope".to_string(), "MINI".to_string()];
    let result = highlighter.highlight_auto("{ fn } if", Some(&subset)).unwrap();
    assert_eq!(result.language.as_deref(), Some("mini"));
}

#[test]
fn test_configured_languages_are_the_default_subset() {
    let mut highlighter = fixtures::highlighter();
    highlighter.configure(PartialHighlightConfig {
        languages: Some(vec!["mini".to_string()]),
        ..Default::default()
    });
    let result = highlighter.highlight_auto("{ fn } if", None).unwrap();
    assert_eq!(result.language.as_deref(), Some("mini"));

    let mut highlighter = Highlighter::with_config(HighlightConfig {
        languages: Some(vec!["blocks".to_string()]),
        ..Default::default()
    });
    highlighter.register_language("blocks", fixtures::blocks).unwrap();
    highlighter.register_language("mini", fixtures::mini).unwrap();
    let result = highlighter.highlight_auto("if if if", None).unwrap();
    assert_eq!(result.language, None);
}

#[test]
fn test_opted_out_grammar_is_never_detected() {
    let highlighter = fixtures::highlighter();
    assert!(!highlighter.auto_detection("template"));
    let subset = vec!["template".to_string()];
    let result = highlighter.highlight_auto("a {{fn}} b", Some(&subset)).unwrap();
    assert_eq!(result.language, None);
}
