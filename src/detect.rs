//! Language auto-detection
//!
//! Every candidate grammar tokenizes the same code and the results are ranked
//! by relevance. The plain-text result (relevance 0) always takes part, so
//! detection never fails for lack of a match.
//!
//! Ranking:
//! - higher relevance first
//! - on equal relevance, a grammar declared `superset_of` another tied
//!   candidate comes before it
//! - otherwise the earlier candidate (registration order) wins

use std::collections::HashSet;

use crate::config::HighlightConfig;
use crate::emitter::Emitter;
use crate::error::Result;
use crate::registry::LanguageRegistry;
use crate::tokenizer::{self, HighlightResult};

/// Highlight `code` with the best scoring of the candidate grammars.
///
/// Candidates are `subset`, else the configured `languages`, else every
/// registered grammar. Unknown names and grammars that opt out of detection
/// are skipped. A candidate that hits an illegal lexeme scores 0.
pub fn highlight_auto<E: Emitter>(
    registry: &LanguageRegistry,
    config: &HighlightConfig,
    code: &str,
    subset: Option<&[String]>,
) -> Result<HighlightResult<E>> {
    let candidates = candidates(registry, config, subset);
    let _span = tracing::trace_span!("highlight_auto", candidates = candidates.len()).entered();

    let mut results = Vec::with_capacity(candidates.len() + 1);
    results.push(HighlightResult::<E>::plain(config, code, None));
    for name in &candidates {
        match tokenizer::highlight::<E>(registry, config, name, code, false, None) {
            Ok(result) => results.push(result),
            Err(e) if e.is_illegal() => {
                let mut result = HighlightResult::plain(config, code, Some(name.as_str()));
                result.illegal = true;
                results.push(result);
            }
            Err(e) => return Err(e),
        }
    }

    rank(registry, &mut results);
    let mut ranked = results.into_iter();
    let Some(mut best) = ranked.next() else {
        return Ok(HighlightResult::plain(config, code, None));
    };
    best.second_best = ranked.next().map(Box::new);
    Ok(best)
}

/// Registered, detectable candidate names without duplicates
fn candidates(registry: &LanguageRegistry, config: &HighlightConfig, subset: Option<&[String]>) -> Vec<String> {
    let requested: Vec<String> = match subset.or(config.languages.as_deref()) {
        Some(names) => names.to_vec(),
        None => registry.names().map(str::to_string).collect(),
    };

    let mut seen = HashSet::new();
    requested
        .iter()
        .filter_map(|name| registry.canonical_name(name))
        .filter(|name| registry.auto_detection(name))
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

/// Stable ordering by relevance, then by superset depth among equal scores
fn rank<E>(registry: &LanguageRegistry, results: &mut [HighlightResult<E>]) {
    let view: &[HighlightResult<E>] = results;
    let depths: Vec<usize> = view
        .iter()
        .map(|result| superset_depth(registry, result, view))
        .collect();
    let mut order: Vec<usize> = (0..view.len()).collect();
    order.sort_by(|&a, &b| {
        view[b]
            .relevance
            .cmp(&view[a].relevance)
            .then(depths[b].cmp(&depths[a]))
    });
    apply_order(results, &order);
}

/// How many grammars scoring the same as `result` it extends, directly or
/// through a chain of `superset_of` declarations
fn superset_depth<E>(registry: &LanguageRegistry, result: &HighlightResult<E>, all: &[HighlightResult<E>]) -> usize {
    let tied = |name: &str| {
        all.iter()
            .any(|r| r.relevance == result.relevance && r.language.as_deref() == Some(name))
    };

    let mut depth = 0;
    let mut current = result.language.clone();
    // at most one hop per result, so superset cycles terminate
    for _ in 0..all.len() {
        let Some(base) = current
            .as_deref()
            .and_then(|name| registry.get(name))
            .and_then(|lang| lang.superset_of())
            .and_then(|base| registry.canonical_name(base))
        else {
            break;
        };
        if !tied(base) {
            break;
        }
        depth += 1;
        current = Some(base.to_string());
    }
    depth
}

fn apply_order<T>(items: &mut [T], order: &[usize]) {
    // position[i] = where the element currently at i must go
    let mut position = vec![0; order.len()];
    for (target, &source) in order.iter().enumerate() {
        position[source] = target;
    }
    for i in 0..items.len() {
        while position[i] != i {
            let j = position[i];
            items.swap(i, j);
            position.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::TokenTree;
    use crate::grammar::{Keywords, Language, Mode};

    fn detect(registry: &LanguageRegistry, code: &str) -> HighlightResult<TokenTree> {
        highlight_auto(registry, &HighlightConfig::default(), code, None).unwrap()
    }

    #[test]
    fn test_apply_order() {
        let mut items = vec!['a', 'b', 'c', 'd'];
        apply_order(&mut items, &[2, 0, 3, 1]);
        assert_eq!(items, vec!['c', 'a', 'd', 'b']);
    }

    #[test]
    fn test_empty_registry_gives_plain_text() {
        let registry = LanguageRegistry::new();
        let result = detect(&registry, "<x & y>");
        assert_eq!(result.language, None);
        assert_eq!(result.relevance, 0);
        assert_eq!(result.value, "&lt;x &amp; y&gt;");
        assert!(result.second_best.is_none());
    }

    #[test]
    fn test_highest_relevance_wins() {
        let mut registry = LanguageRegistry::new();
        registry.register("a", |_| Language::new("A").keywords("alpha")).unwrap();
        registry
            .register("b", |_| Language::new("B").keywords(Keywords::words("beta|5 alpha")))
            .unwrap();
        let result = detect(&registry, "alpha beta");
        assert_eq!(result.language.as_deref(), Some("b"));
        assert_eq!(result.relevance, 6);
        assert_eq!(result.second_best.unwrap().language.as_deref(), Some("a"));
    }

    #[test]
    fn test_zero_scores_fall_back_to_plain_text() {
        let mut registry = LanguageRegistry::new();
        registry.register("a", |_| Language::new("A").keywords("alpha")).unwrap();
        let result = detect(&registry, "nothing here");
        assert_eq!(result.language, None);
        assert_eq!(result.second_best.unwrap().language.as_deref(), Some("a"));
    }

    #[test]
    fn test_superset_wins_exact_tie() {
        let mut registry = LanguageRegistry::new();
        registry.register("derived", |_| Language::new("Derived").superset_of("base").keywords("fn")).unwrap();
        registry.register("base", |_| Language::new("Base").keywords("fn")).unwrap();
        let result = detect(&registry, "fn");
        assert_eq!(result.language.as_deref(), Some("derived"));

        let mut registry = LanguageRegistry::new();
        registry.register("base", |_| Language::new("Base").keywords("fn")).unwrap();
        registry.register("derived", |_| Language::new("Derived").superset_of("base").keywords("fn")).unwrap();
        let result = detect(&registry, "fn");
        assert_eq!(result.language.as_deref(), Some("derived"));
        assert_eq!(result.second_best.unwrap().language.as_deref(), Some("base"));
    }

    #[test]
    fn test_unrelated_tie_keeps_registration_order() {
        let mut registry = LanguageRegistry::new();
        registry.register("first", |_| Language::new("First").keywords("fn")).unwrap();
        registry.register("second", |_| Language::new("Second").keywords("fn")).unwrap();
        assert_eq!(detect(&registry, "fn").language.as_deref(), Some("first"));
    }

    #[test]
    fn test_illegal_candidate_scores_zero() {
        let mut registry = LanguageRegistry::new();
        registry
            .register("strict", |_| Language::new("Strict").keywords("fn|10").illegal(";"))
            .unwrap();
        registry.register("loose", |_| Language::new("Loose").keywords("fn")).unwrap();
        let result = detect(&registry, "fn;");
        assert_eq!(result.language.as_deref(), Some("loose"));
        let second = result.second_best.unwrap();
        assert_eq!(second.language, None);
    }

    #[test]
    fn test_subset_filters_unknown_and_undetectable() {
        let mut registry = LanguageRegistry::new();
        registry.register("a", |_| Language::new("A").keywords("alpha")).unwrap();
        registry
            .register("hidden", |_| Language::new("Hidden").keywords("alpha|9").disable_autodetect())
            .unwrap();
        let subset = vec!["hidden".to_string(), "missing".to_string(), "A".to_string()];
        let result =
            highlight_auto::<TokenTree>(&registry, &HighlightConfig::default(), "alpha", Some(&subset)).unwrap();
        assert_eq!(result.language.as_deref(), Some("a"));
    }

    #[test]
    fn test_configured_languages_limit_candidates() {
        let mut registry = LanguageRegistry::new();
        registry.register("a", |_| Language::new("A").keywords("alpha")).unwrap();
        registry.register("b", |_| Language::new("B").contain(Mode::new().begin("alpha").relevance(4))).unwrap();
        let config = HighlightConfig {
            languages: Some(vec!["a".to_string()]),
            ..Default::default()
        };
        let result = highlight_auto::<TokenTree>(&registry, &config, "alpha", None).unwrap();
        assert_eq!(result.language.as_deref(), Some("a"));
    }
}
