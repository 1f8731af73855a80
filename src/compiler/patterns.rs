//! Regex source utilities
//!
//! Grammar patterns are regex *sources*. They get combined into larger
//! alternations, so the numbered backreferences inside each one have to be
//! shifted by the number of groups that precede it in the combined pattern.

use fancy_regex::Regex;
use once_cell::sync::Lazy;

/// Zero-width pattern that matches at every position
pub const EMPTY_MATCH_RE: &str = r"\B|\b";

/// Tokens that matter when renumbering groups: character classes (skipped
/// whole), group openers, numbered backreferences and other escapes
static GROUP_TOKEN_RE: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"(?s)\[(?:[^\\\]]|\\.)*\]|\(\??|\\([1-9][0-9]*)|\\.")
        .expect("group token pattern is valid")
});

/// Characters with a meaning outside character classes
const META_CHARS: &[char] = &['\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$'];

/// Escape a literal so it matches itself
pub fn escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if META_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Concatenate sources into one sequence
pub fn concat(parts: &[&str]) -> String {
    parts.concat()
}

/// One group matching any of the sources
pub fn either(parts: &[&str]) -> String {
    format!("({})", parts.join("|"))
}

/// Compile a source the way every grammar pattern is compiled: multi-line,
/// optionally case-insensitive
pub fn compile(source: &str, case_insensitive: bool) -> Result<Regex, fancy_regex::Error> {
    let flags = if case_insensitive { "(?mi)" } else { "(?m)" };
    Regex::new(&format!("{}{}", flags, source))
}

/// Number of capture groups in a source
pub fn count_groups(source: &str) -> Result<usize, fancy_regex::Error> {
    let re = Regex::new(source)?;
    Ok(re.captures_len().saturating_sub(1))
}

/// Whether `re` matches `text` exactly at byte offset `pos`
pub fn matches_at(re: &Regex, text: &str, pos: usize) -> Result<bool, fancy_regex::Error> {
    if pos > text.len() {
        return Ok(false);
    }
    Ok(re
        .find_from_pos(text, pos)?
        .is_some_and(|m| m.start() == pos))
}

/// Wrap each source in its own group and join them with `separator`,
/// rewriting every `\N` backreference so it still refers to the group it
/// referred to in its own source.
pub fn join_renumbered<S: AsRef<str>>(sources: &[S], separator: &str) -> String {
    let mut group_count = 0usize;
    let mut joined = Vec::with_capacity(sources.len());

    for source in sources {
        group_count += 1;
        let offset = group_count;
        let mut rest = source.as_ref();
        let mut rewritten = String::with_capacity(rest.len() + 2);

        while !rest.is_empty() {
            let Some(caps) = GROUP_TOKEN_RE.captures(rest) else {
                rewritten.push_str(rest);
                break;
            };
            let Some(token) = caps.get(0) else {
                break;
            };
            rewritten.push_str(&rest[..token.start()]);
            let after = &rest[token.end()..];

            match caps.get(1).and_then(|n| n.as_str().parse::<usize>().ok()) {
                Some(n) => {
                    rewritten.push('\\');
                    rewritten.push_str(&(n + offset).to_string());
                }
                None => {
                    rewritten.push_str(token.as_str());
                    if token.as_str() == "(" || (token.as_str() == "(?" && opens_named_group(after)) {
                        group_count += 1;
                    }
                }
            }
            rest = after;
        }

        joined.push(format!("({})", rewritten));
    }

    joined.join(separator)
}

/// `(?` followed by `P<name>` or `<name>` (but not a lookbehind) still captures
fn opens_named_group(after: &str) -> bool {
    after.starts_with("P<")
        || (after.starts_with('<') && !after.starts_with("<=") && !after.starts_with("<!"))
}

/// Byte offset of the character after the one starting at `pos`
pub fn next_char_boundary(text: &str, pos: usize) -> Option<usize> {
    text.get(pos..)?.chars().next().map(|c| pos + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_wraps_each_source() {
        assert_eq!(join_renumbered(&["a", "b"], "|"), "(a)|(b)");
    }

    #[test]
    fn test_join_shifts_backreferences() {
        // second source's group 1 becomes group 4: (a(b)) takes 1-2, wrapper of source 2 is 3
        let joined = join_renumbered(&["a(b)", r"(['\x22])\w+\1"], "|");
        assert_eq!(joined, r"(a(b))|((['\x22])\w+\4)");
    }

    #[test]
    fn test_join_ignores_groups_in_classes_and_escapes() {
        let joined = join_renumbered(&[r"[(]\(x", r"(y)\1"], "|");
        assert_eq!(joined, r"([(]\(x)|((y)\3)");
    }

    #[test]
    fn test_join_skips_non_capturing_and_lookaround() {
        let joined = join_renumbered(&[r"(?:a)(?=b)(?<!c)", r"(d)\1"], "|");
        assert_eq!(joined, r"((?:a)(?=b)(?<!c))|((d)\3)");
    }

    #[test]
    fn test_join_counts_named_groups() {
        let joined = join_renumbered(&[r"(?P<q>a)", r"(d)\1"], "|");
        assert_eq!(joined, r"((?P<q>a))|((d)\4)");
    }

    #[test]
    fn test_renumbered_backreferences_still_match() {
        let joined = join_renumbered(&[r"(x)\1", r"(['\x22]).*?\1"], "|");
        let re = compile(&joined, false).unwrap();
        let caps = re.captures("'abc'").unwrap().unwrap();
        assert_eq!(caps.get(0).unwrap().as_str(), "'abc'");
        assert!(caps.get(3).is_some());
        assert!(re.captures("'abc\"").unwrap().is_none());
    }

    #[test]
    fn test_count_groups() {
        assert_eq!(count_groups("a").unwrap(), 0);
        assert_eq!(count_groups("(a)(?:b)(c(d))").unwrap(), 3);
        assert!(count_groups("(").is_err());
    }

    #[test]
    fn test_matches_at() {
        let re = compile("b", false).unwrap();
        assert!(matches_at(&re, "abc", 1).unwrap());
        assert!(!matches_at(&re, "abc", 0).unwrap());
        assert!(!matches_at(&re, "abc", 9).unwrap());
    }

    #[test]
    fn test_empty_match_matches_everywhere() {
        let re = compile(EMPTY_MATCH_RE, false).unwrap();
        for pos in 0..=4 {
            assert!(matches_at(&re, "ab c", pos).unwrap(), "at {}", pos);
        }
    }

    #[test]
    fn test_helpers() {
        assert_eq!(either(&["a", "b"]), "(a|b)");
        assert_eq!(concat(&["a", "b"]), "ab");
        assert_eq!(escape("a.b"), r"a\.b");
        assert_eq!(escape("#(x)"), r"#\(x\)");
        assert_eq!(next_char_boundary("é!", 0), Some(2));
        assert_eq!(next_char_boundary("a", 1), None);
    }
}
