//! Mode-stack tokenizer
//!
//! Walks the input once. The top of the mode stack decides which rules are
//! active; text between matches is the content of the top mode and is either
//! scanned for keywords or handed to a sub-language. Every begin match pushes
//! a mode and opens a node, every end match pops back to the mode whose end
//! matched and closes the nodes on the way. Relevance is the sum of keyword
//! weights and of the weights of the modes that were closed.

use std::collections::HashMap;

use fancy_regex::Regex;

use crate::compiler::matcher::{MatcherCursor, RuleKind, RuleMatch};
use crate::compiler::patterns::{self, next_char_boundary};
use crate::compiler::{CompiledLanguage, CompiledMode, ModeId};
use crate::config::HighlightConfig;
use crate::detect;
use crate::emitter::{Emitter, TokenTree};
use crate::error::{HighlightError, Result};
use crate::grammar::{MatchDecision, ModeData, SubLanguage};
use crate::registry::LanguageRegistry;

/// Iterations after which the loop guard starts checking progress
const MAX_ITERATIONS: usize = 100_000;

/// Bytes of input shown on either side of an illegal lexeme
const ERROR_CONTEXT: usize = 100;

/// Mode name used in errors for modes without a class
const UNNAMED_MODE: &str = "<unnamed>";

#[derive(Debug, Clone)]
struct Frame {
    mode: ModeId,
    /// End pattern fixed at begin time (`end_same_as_begin`)
    end_override: Option<Regex>,
    data: ModeData,
}

impl Frame {
    fn new(mode: ModeId) -> Self {
        Self {
            mode,
            end_override: None,
            data: ModeData::default(),
        }
    }
}

/// The mode stack a tokenization ended with; passing it back in continues
/// tokenizing in the same state
#[derive(Debug, Clone)]
pub struct ModeStack {
    language: String,
    frames: Vec<Frame>,
}

impl ModeStack {
    /// Registered name of the language the stack belongs to
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Number of open modes, the root included
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open modes from the root up
    pub fn modes(&self) -> impl Iterator<Item = ModeId> + '_ {
        self.frames.iter().map(|f| f.mode)
    }

    /// Frames to resume from, if the stack fits `language`
    fn frames_for(&self, name: &str, language: &CompiledLanguage) -> Option<Vec<Frame>> {
        let fits = self.language == name
            && self.frames.first().map(|f| f.mode) == Some(language.root())
            && self.frames.iter().all(|f| language.get_mode(f.mode).is_some());
        fits.then(|| self.frames.clone())
    }
}

/// Outcome of highlighting one piece of code
#[derive(Debug, Clone)]
pub struct HighlightResult<E = TokenTree> {
    /// Registered name of the language used; `None` for the plain-text fallback
    pub language: Option<String>,
    pub relevance: u32,
    /// Rendered HTML
    pub value: String,
    pub emitter: E,
    /// Tokenization stopped on an illegal lexeme (auto-detection candidates only)
    pub illegal: bool,
    /// Mode stack at the end of the input
    pub top: Option<ModeStack>,
    /// Runner-up of auto-detection
    pub second_best: Option<Box<HighlightResult<E>>>,
    /// Error recovered from in safe mode
    pub error_raised: Option<HighlightError>,
}

impl<E: Emitter> HighlightResult<E> {
    /// The whole code as a single text leaf
    pub(crate) fn plain(config: &HighlightConfig, code: &str, language: Option<&str>) -> Self {
        let mut emitter = E::new(config);
        emitter.add_text(code);
        emitter.finalize();
        Self {
            language: language.map(str::to_string),
            relevance: 0,
            value: emitter.to_html(),
            emitter,
            illegal: false,
            top: None,
            second_best: None,
            error_raised: None,
        }
    }
}

impl HighlightResult<TokenTree> {
    pub fn tree(&self) -> &TokenTree {
        &self.emitter
    }
}

/// Highlight `code` as the language registered under `name`
pub fn highlight<E: Emitter>(
    registry: &LanguageRegistry,
    config: &HighlightConfig,
    name: &str,
    code: &str,
    ignore_illegals: bool,
    continuation: Option<&ModeStack>,
) -> Result<HighlightResult<E>> {
    let Some((key, language)) = registry.resolve(name) else {
        return Err(HighlightError::UnknownLanguage(name.to_string()));
    };
    let _span = tracing::trace_span!("highlight", language = key, len = code.len()).entered();

    let frames = continuation
        .and_then(|stack| stack.frames_for(key, language))
        .unwrap_or_else(|| vec![Frame::new(language.root())]);

    let tokenizer = Tokenizer {
        registry,
        config,
        name: key,
        language,
        code,
        ignore_illegals,
        emitter: E::new(config),
        frames,
        continuations: HashMap::new(),
        mode_buffer: String::new(),
        relevance: 0,
        iterations: 0,
        cursor: MatcherCursor::default(),
        resume: false,
        last_match: None,
    };
    tokenizer.run()
}

#[derive(Debug, Clone, Copy)]
struct LastMatch {
    kind: RuleKind,
    index: usize,
}

struct Tokenizer<'a, E> {
    registry: &'a LanguageRegistry,
    config: &'a HighlightConfig,
    name: &'a str,
    language: &'a CompiledLanguage,
    code: &'a str,
    ignore_illegals: bool,
    emitter: E,
    frames: Vec<Frame>,
    /// Where each named sub-language stopped, within this call
    continuations: HashMap<String, ModeStack>,
    mode_buffer: String,
    relevance: u32,
    iterations: usize,
    cursor: MatcherCursor,
    /// Next scan retries the remaining rules at the same offset
    resume: bool,
    last_match: Option<LastMatch>,
}

impl<'a, E: Emitter> Tokenizer<'a, E> {
    fn run(mut self) -> Result<HighlightResult<E>> {
        self.open_continuation_nodes();
        match self.scan() {
            Ok(()) => {
                self.emitter.close_all_nodes();
                self.emitter.finalize();
                Ok(HighlightResult {
                    language: Some(self.name.to_string()),
                    relevance: self.relevance,
                    value: self.emitter.to_html(),
                    emitter: self.emitter,
                    illegal: false,
                    top: Some(ModeStack {
                        language: self.name.to_string(),
                        frames: self.frames,
                    }),
                    second_best: None,
                    error_raised: None,
                })
            }
            Err(e) if e.is_illegal() || !self.config.safe_mode => Err(e),
            Err(e) => {
                tracing::debug!("Recovered from highlighting error in {}: {}", self.name, e);
                let mut result = HighlightResult::plain(self.config, self.code, Some(self.name));
                result.error_raised = Some(e);
                Ok(result)
            }
        }
    }

    fn open_continuation_nodes(&mut self) {
        let language = self.language;
        for frame in self.frames.iter().skip(1) {
            if let Some(class) = language.mode(frame.mode).class_name() {
                self.emitter.open_node(language.display_class(class));
            }
        }
    }

    fn top_mode(&self) -> &'a CompiledMode {
        let language = self.language;
        let id = self.frames.last().map_or(language.root(), |f| f.mode);
        language.mode(id)
    }

    fn scan(&mut self) -> Result<()> {
        let code = self.code;
        let mut index = 0;
        loop {
            self.iterations += 1;
            if self.resume {
                self.resume = false;
            } else {
                self.cursor.consider_all();
            }
            self.cursor.last_index = index;

            let top = self.top_mode();
            let Some(found) = top.matcher.exec(&mut self.cursor, code)? else {
                break;
            };
            let before = code.get(index..found.index()).unwrap_or_default();
            let processed = self.process_lexeme(before, &found)?;
            index = found.index() + processed;
        }

        self.mode_buffer.push_str(code.get(index..).unwrap_or_default());
        self.process_buffer()
    }

    fn process_lexeme(&mut self, before: &str, found: &RuleMatch) -> Result<usize> {
        self.mode_buffer.push_str(before);
        let lexeme = found.lexeme();

        if let Some(LastMatch {
            kind: RuleKind::Begin(begun),
            index,
        }) = self.last_match
        {
            if found.kind() == RuleKind::End && index == found.index() && lexeme.is_empty() {
                let advanced = self.push_char_at(found.index());
                if !self.config.safe_mode {
                    return Err(HighlightError::ZeroWidthMatch {
                        language: self.name.to_string(),
                        rule: self.language.mode(begun).begin.clone(),
                    });
                }
                return Ok(advanced);
            }
        }
        self.last_match = Some(LastMatch {
            kind: found.kind(),
            index: found.index(),
        });

        match found.kind() {
            RuleKind::Begin(id) => return self.do_begin(found, id),
            RuleKind::Illegal if !self.ignore_illegals => return Err(self.illegal_error(found)),
            RuleKind::End => {
                if let Some(processed) = self.do_end(found)? {
                    return Ok(processed);
                }
            }
            RuleKind::Illegal => {}
        }

        if found.kind() == RuleKind::Illegal && lexeme.is_empty() {
            return Ok(self.push_char_at(found.index()));
        }

        if self.iterations > MAX_ITERATIONS && self.iterations > found.index() * 3 {
            return Err(HighlightError::InfiniteLoop {
                language: self.name.to_string(),
                iterations: self.iterations,
            });
        }

        self.mode_buffer.push_str(lexeme);
        Ok(lexeme.len())
    }

    /// Move the character at `index` into the buffer; returns how far to advance
    fn push_char_at(&mut self, index: usize) -> usize {
        match next_char_boundary(self.code, index) {
            Some(next) => {
                self.mode_buffer.push_str(&self.code[index..next]);
                next - index
            }
            None => 1,
        }
    }

    fn do_begin(&mut self, found: &RuleMatch, id: ModeId) -> Result<usize> {
        let language = self.language;
        let mode = language.mode(id);
        let lexeme = found.lexeme();
        let mut data = ModeData::default();

        if mode.skip_after_dot && self.code[..found.index()].ends_with('.') {
            return Ok(self.do_ignore(found));
        }
        if let Some(guard) = &mode.on_begin {
            if guard.check(found, &mut data) == MatchDecision::Reject {
                return Ok(self.do_ignore(found));
            }
        }

        let end_override = if mode.end_same_as_begin {
            let literal = patterns::escape(lexeme);
            Some(
                patterns::compile(&literal, language.case_insensitive()).map_err(|e| {
                    HighlightError::Regex {
                        pattern: literal.clone(),
                        message: e.to_string(),
                    }
                })?,
            )
        } else {
            None
        };

        if mode.skip {
            self.mode_buffer.push_str(lexeme);
        } else {
            if mode.exclude_begin {
                self.mode_buffer.push_str(lexeme);
            }
            self.process_buffer()?;
            if !mode.return_begin && !mode.exclude_begin {
                self.mode_buffer = lexeme.to_string();
            }
        }
        self.start_mode(id, end_override, data);
        Ok(if mode.return_begin { 0 } else { lexeme.len() })
    }

    /// A rejected begin match: try the remaining rules at the same offset, or
    /// take one character as text when none are left
    fn do_ignore(&mut self, found: &RuleMatch) -> usize {
        if self.cursor.regex_index == 0 {
            self.push_char_at(found.index())
        } else {
            self.resume = true;
            0
        }
    }

    fn start_mode(&mut self, id: ModeId, end_override: Option<Regex>, data: ModeData) {
        let language = self.language;
        if let Some(class) = language.mode(id).class_name() {
            self.emitter.open_node(language.display_class(class));
        }
        self.frames.push(Frame {
            mode: id,
            end_override,
            data,
        });
    }

    /// Returns `None` when no open mode actually ends here
    fn do_end(&mut self, found: &RuleMatch) -> Result<Option<usize>> {
        let Some(end_index) = self.end_of_mode(self.frames.len().saturating_sub(1), found)? else {
            return Ok(None);
        };
        let origin = self.top_mode();
        let lexeme = found.lexeme();

        if origin.skip {
            self.mode_buffer.push_str(lexeme);
        } else {
            if !(origin.return_end || origin.exclude_end) {
                self.mode_buffer.push_str(lexeme);
            }
            self.process_buffer()?;
            if origin.exclude_end {
                self.mode_buffer = lexeme.to_string();
            }
        }

        let language = self.language;
        let mut ended = None;
        while self.frames.len() > end_index.max(1) {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            let mode = language.mode(frame.mode);
            if mode.class_name.is_some() {
                self.emitter.close_node();
            }
            if !mode.skip && mode.sub_language.is_none() {
                self.relevance = self.relevance.saturating_add(mode.relevance);
            }
            ended = Some(frame);
        }

        if let Some(frame) = ended {
            let end_mode = language.mode(frame.mode);
            if let Some(starts) = end_mode.starts {
                let end_override = if end_mode.end_same_as_begin {
                    frame.end_override
                } else {
                    None
                };
                self.start_mode(starts, end_override, ModeData::default());
            }
        }

        Ok(Some(if origin.return_end { 0 } else { lexeme.len() }))
    }

    /// Index of the frame that ends at this match, following `ends_parent`
    /// upwards and `ends_with_parent` outwards
    fn end_of_mode(&mut self, mut index: usize, found: &RuleMatch) -> Result<Option<usize>> {
        let language = self.language;
        loop {
            let Some(frame) = self.frames.get_mut(index) else {
                return Ok(None);
            };
            let mode = language.mode(frame.mode);

            let mut matched = match frame.end_override.as_ref().or(mode.end_re.as_ref()) {
                Some(re) => patterns::matches_at(re, self.code, found.index()).map_err(|e| {
                    HighlightError::Regex {
                        pattern: re.as_str().to_string(),
                        message: e.to_string(),
                    }
                })?,
                None => false,
            };
            if matched {
                if let Some(guard) = &mode.on_end {
                    matched = guard.check(found, &mut frame.data) == MatchDecision::Accept;
                }
            }

            if matched {
                let mut end = index;
                while end > 1 && language.mode(self.frames[end].mode).ends_parent {
                    end -= 1;
                }
                return Ok(Some(end));
            }
            if mode.ends_with_parent && index > 0 {
                index -= 1;
                continue;
            }
            return Ok(None);
        }
    }

    fn process_buffer(&mut self) -> Result<()> {
        let mode = self.top_mode();
        let buffer = std::mem::take(&mut self.mode_buffer);
        match &mode.sub_language {
            Some(sub) => self.process_sub_language(mode, sub, &buffer),
            None => self.process_keywords(mode, &buffer),
        }
    }

    fn process_keywords(&mut self, mode: &CompiledMode, buffer: &str) -> Result<()> {
        let Some(keywords) = &mode.keywords else {
            self.emitter.add_text(buffer);
            return Ok(());
        };
        let language = self.language;

        let mut last = 0;
        let mut pending = String::new();
        for word in mode.keyword_pattern.find_iter(buffer) {
            let word = word.map_err(|e| HighlightError::Regex {
                pattern: mode.keyword_pattern.as_str().to_string(),
                message: e.to_string(),
            })?;
            pending.push_str(&buffer[last..word.start()]);
            match keywords.get(word.as_str(), language.case_insensitive()) {
                Some(entry) => {
                    self.emitter.add_text(&pending);
                    pending.clear();
                    self.relevance = self.relevance.saturating_add(entry.relevance);
                    if entry.category.starts_with('_') {
                        pending.push_str(word.as_str());
                    } else {
                        self.emitter
                            .add_keyword(word.as_str(), language.display_class(&entry.category));
                    }
                }
                None => pending.push_str(word.as_str()),
            }
            last = word.end();
        }
        pending.push_str(&buffer[last..]);
        self.emitter.add_text(&pending);
        Ok(())
    }

    fn process_sub_language(&mut self, mode: &CompiledMode, sub: &SubLanguage, buffer: &str) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let result: HighlightResult<E> = match sub {
            SubLanguage::Named(name) => {
                let Some((key, _)) = self.registry.resolve(name) else {
                    tracing::warn!("Sub-language '{}' is not registered, emitting plain text", name);
                    self.emitter.add_text(buffer);
                    return Ok(());
                };
                let result = highlight::<E>(
                    self.registry,
                    self.config,
                    key,
                    buffer,
                    true,
                    self.continuations.get(key),
                )?;
                if let Some(top) = &result.top {
                    self.continuations.insert(key.to_string(), top.clone());
                }
                result
            }
            SubLanguage::Detect(candidates) => {
                let subset = (!candidates.is_empty()).then_some(candidates.as_slice());
                detect::highlight_auto::<E>(self.registry, self.config, buffer, subset)?
            }
        };

        if mode.relevance > 0 {
            self.relevance = self.relevance.saturating_add(result.relevance);
        }
        self.emitter
            .add_sublanguage(result.emitter, result.language.as_deref());
        Ok(())
    }

    fn illegal_error(&self, found: &RuleMatch) -> HighlightError {
        let offset = found.index();
        let start = char_floor(self.code, offset.saturating_sub(ERROR_CONTEXT));
        let end = char_ceil(self.code, offset + ERROR_CONTEXT);
        HighlightError::IllegalLexeme {
            language: self.name.to_string(),
            mode: self
                .top_mode()
                .class_name()
                .unwrap_or(UNNAMED_MODE)
                .to_string(),
            lexeme: found.lexeme().to_string(),
            offset,
            context: self.code[start..end].to_string(),
        }
    }
}

fn char_floor(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn char_ceil(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
