//! Bash and other sh-like shells

use crate::grammar::helpers::Helpers;
use crate::grammar::{Keywords, Language, LateMode, Mode};

const SH_LIKE_SHELLS: &[&str] = &["fish", "bash", "zsh", "sh", "csh", "ksh", "tcsh", "dash", "scsh"];

const KEYWORDS: &str = "if then else elif fi for while in do done case esac function";
const LITERALS: &str = "true false";
const BUILT_INS: &str = "break cd continue eval exec exit export getopts hash pwd readonly return shift test times \
    trap umask unset alias bind builtin caller command declare echo enable help let local logout mapfile printf \
    read readarray source type typeset ulimit unalias set shopt autoload bg bindkey bye cap chdir clone \
    comparguments compcall compctl compdescribe compfiles compgroups compquote comptags comptry compvalues dirs \
    disable disown echotc echoti emulate fc fg float functions getcap getln history integer jobs kill limit log \
    noglob popd print pushd pushln rehash sched setcap setopt stat suspend ttyctl unfunction unhash unlimit \
    unsetopt vared wait whence where which zcompile zformat zftp zle zmodload zparseopts zprof zpty zregexparse \
    zsocket zstyle ztcp";

pub(super) fn language(h: &Helpers) -> Language {
    let var = LateMode::new();
    let subst = LateMode::new();

    let braced_var = Mode::new()
        .begin(r"\$\{")
        .end(r"\}")
        .contain_self()
        .contain(Mode::new().begin(":-").contain(&var));
    var.set(Mode::new().class_name("variable").variants([
        Mode::new().begin(r"\$[\w\d#@][\w\d_]*(?![\w\d])(?![$])"),
        braced_var,
    ]));

    let quote_string = Mode::new()
        .class_name("string")
        .begin("\"")
        .end("\"")
        .contain(h.backslash_escape())
        .contain(&var)
        .contain(&subst)
        .into_ref();
    subst.set(
        Mode::new()
            .class_name("subst")
            .begin(r"\$\(")
            .end(r"\)")
            .contain(h.backslash_escape())
            .contain(&quote_string),
    );

    let here_doc = Mode::new().begin(r"<<-?\s*(?=\w+)").starts(
        Mode::new().contain(h.end_same_as_begin(Mode::new().class_name("string").begin(r"(\w+)").end(r"(\w+)"))),
    );

    let arithmetic = Mode::new()
        .begin(r"\$\(\(")
        .end(r"\)\)")
        .contain(Mode::new().class_name("number").begin(r"\d+#[0-9a-f]+"))
        .contain(h.number_mode())
        .contain(&var);

    let function = Mode::new()
        .class_name("function")
        .begin(r"\w[\w\d_]*\s*\(\s*\)\s*\{")
        .return_begin()
        .relevance(0)
        .contain(h.title_mode().begin(r"\w[\w\d_]*"));

    let shells = format!("({})", SH_LIKE_SHELLS.join("|"));
    let known_shebang = h.shebang(Some(shells.as_str())).relevance(10);

    Language::new("Bash")
        .aliases(["sh", "zsh"])
        .keywords(
            Keywords::new()
                .pattern(r"\b[a-z._-]+\b")
                .category("keyword", KEYWORDS)
                .category("literal", LITERALS)
                .category("built_in", BUILT_INS),
        )
        .contain(known_shebang)
        .contain(h.shebang(None))
        .contain(function)
        .contain(arithmetic)
        .contain(h.hash_comment_mode())
        .contain(here_doc)
        .contain(&quote_string)
        .contain(Mode::new().begin(r#"\\""#))
        .contain(Mode::new().class_name("string").begin("'").end("'"))
        .contain(&var)
}

#[cfg(test)]
mod tests {
    use crate::config::HighlightConfig;
    use crate::emitter::TokenTree;
    use crate::registry::LanguageRegistry;
    use crate::tokenizer::{self, HighlightResult};

    fn highlight(code: &str) -> HighlightResult<TokenTree> {
        let mut registry = LanguageRegistry::new();
        registry.register("bash", super::language).unwrap();
        tokenizer::highlight(&registry, &HighlightConfig::default(), "bash", code, false, None).unwrap()
    }

    #[test]
    fn test_keywords_and_variables() {
        let result = highlight("echo $HOME");
        assert_eq!(
            result.value,
            r#"<span class="hljs-built_in">echo</span> <span class="hljs-variable">$HOME</span>"#
        );
    }

    #[test]
    fn test_variable_inside_string() {
        let result = highlight(r#""a $b""#);
        assert_eq!(
            result.value,
            r#"<span class="hljs-string">&quot;a <span class="hljs-variable">$b</span>&quot;</span>"#
        );
    }

    #[test]
    fn test_known_shebang_scores_high() {
        let result = highlight("#!/bin/bash\nls");
        assert!(result.value.starts_with(r#"<span class="hljs-meta">#!/bin/bash</span>"#));
        assert!(result.relevance >= 10);
    }

    #[test]
    fn test_comment_is_not_a_shebang_later_on() {
        let result = highlight("x\n#!/bin/sh");
        assert!(result.value.contains(r#"<span class="hljs-comment">#!/bin/sh</span>"#));
    }

    #[test]
    fn test_here_doc_ends_on_same_word() {
        let result = highlight("cat <<EOF\nhi\nEOF\n");
        assert_eq!(result.tree().text(), "cat <<EOF\nhi\nEOF\n");
        assert!(result
            .value
            .contains("<span class=\"hljs-string\">EOF\nhi\nEOF</span>"));
    }
}
