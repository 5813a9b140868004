//! Argument-name scanner for function and method signatures.
//!
//! Finds definition headers (`function foo(`, `def f(`, ...) with a
//! grammar-specific anchor pattern, then walks each parameter list one char
//! at a time tracking paren/bracket/brace depth and quote state. Commas
//! inside nested calls, literals, or strings are never argument separators,
//! which is what puts this beyond a single regex. Each parameter yields one
//! range covering the name token only: reference/spread markers (`&`,
//! `...`, `*`/`**`), type annotations, and everything after a default-value
//! `=` stay out of the range.

use std::sync::Arc;

use regex::Regex;
use tracing::{error, trace};

use crate::profile::{Rule, ScannerFn, NEVER_MATCHING};
use crate::range::HighlightRange;
use crate::text::SourceText;

// Header anchors end at the opening paren; scanning starts right after it.
const PHP_HEADER: &str = r"\bfunction\b\s*&?\s*\w*\s*\(|\bfn\b\s*&?\s*\(";
const PYTHON_HEADER: &str = r"\bdef\s+\w+\s*\(";
const JAVASCRIPT_HEADER: &str = r"\bfunction\s*\*?\s*(?:[A-Za-z_$][\w$]*)?\s*\(";

// Name patterns run against one argument truncated at its default-value
// `=`. Group 1 is the name token; optional markers stay outside the group.
// PHP searches for the `$` sigil (type hints precede the name); the
// sigil-less grammars anchor at the argument start instead.
const PHP_NAME: &str = r"(?:&\s*)?(?:\.\.\.\s*)?(\$[A-Za-z_]\w*)";
const PYTHON_NAME: &str = r"^\s*(?:\*{1,2}\s*)?([A-Za-z_]\w*)";
const JAVASCRIPT_NAME: &str = r"^\s*(?:\.\.\.\s*)?([A-Za-z_$][\w$]*)";

/// Quote tracking while walking a parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Outside any string literal.
    Code,
    /// Inside a literal opened by `quote`; `escaped` is set when the
    /// previous char was an unconsumed backslash.
    Quoted { quote: char, escaped: bool },
}

/// Delimiter nesting inside one parameter list. Paren depth starts at 1,
/// the header's own opening paren.
#[derive(Debug, Clone, Copy)]
struct Depths {
    paren: usize,
    bracket: usize,
    brace: usize,
}

impl Depths {
    fn new() -> Self {
        Self {
            paren: 1,
            bracket: 0,
            brace: 0,
        }
    }

    /// Top level of the parameter list, where commas separate arguments.
    fn at_separator_level(&self) -> bool {
        self.paren == 1 && self.bracket == 0 && self.brace == 0
    }
}

/// Extracts parameter-name ranges from definition headers in one grammar.
///
/// Usable standalone via [`scan`](Self::scan) or as a profile rule via
/// [`into_rule`](Self::into_rule). State fully resets between headers.
pub struct ArgumentScanner {
    grammar: &'static str,
    header: Regex,
    name: Regex,
    quotes: &'static [char],
}

impl ArgumentScanner {
    /// PHP: `function`/`fn` headers, `$`-sigil parameter names.
    pub fn php() -> Self {
        Self::from_parts("php", PHP_HEADER, PHP_NAME, &['"', '\''])
    }

    /// Python: `def` headers, bare parameter names, `*`/`**` markers.
    pub fn python() -> Self {
        Self::from_parts("python", PYTHON_HEADER, PYTHON_NAME, &['"', '\''])
    }

    /// JavaScript: `function` headers (incl. generators and anonymous
    /// functions), bare names, `...` rest markers.
    pub fn javascript() -> Self {
        Self::from_parts(
            "javascript",
            JAVASCRIPT_HEADER,
            JAVASCRIPT_NAME,
            &['"', '\'', '`'],
        )
    }

    fn from_parts(
        grammar: &'static str,
        header: &str,
        name: &str,
        quotes: &'static [char],
    ) -> Self {
        Self {
            grammar,
            header: compile(grammar, header),
            name: compile(grammar, name),
            quotes,
        }
    }

    /// Grammar identifier ("php", "python", "javascript").
    pub fn grammar(&self) -> &'static str {
        self.grammar
    }

    /// One range per parameter name, in header order then left to right.
    pub fn scan(&self, text: &SourceText) -> Vec<HighlightRange> {
        let mut ranges = Vec::new();
        for header in self.header.find_iter(text.as_str()) {
            // The match ends just past the opening paren.
            let list_start = text.byte_to_char(header.end());
            self.scan_list(text, list_start, &mut ranges);
        }
        ranges
    }

    /// Wrap as a profile rule.
    pub fn into_rule(self) -> Rule {
        Rule::Scanner(self.into_scanner_fn())
    }

    /// Wrap as a shareable scanner function. The builtin scanners are
    /// total, so the function always returns `Ok`.
    pub fn into_scanner_fn(self) -> ScannerFn {
        Arc::new(move |text: &SourceText| Ok(self.scan(text)))
    }

    /// Walk one parameter list starting at `list_start` (the char right
    /// after the header's opening paren).
    fn scan_list(&self, text: &SourceText, list_start: usize, out: &mut Vec<HighlightRange>) {
        let mut depths = Depths::new();
        let mut state = ScanState::Code;
        let mut arg_start = list_start;

        let tail = &text.as_str()[text.char_to_byte(list_start)..];
        let mut pos = list_start;
        for ch in tail.chars() {
            match state {
                ScanState::Quoted { quote, escaped } => {
                    if escaped {
                        state = ScanState::Quoted {
                            quote,
                            escaped: false,
                        };
                    } else if ch == '\\' {
                        state = ScanState::Quoted {
                            quote,
                            escaped: true,
                        };
                    } else if ch == quote {
                        state = ScanState::Code;
                    }
                }
                ScanState::Code => match ch {
                    quote if self.quotes.contains(&quote) => {
                        state = ScanState::Quoted {
                            quote,
                            escaped: false,
                        };
                    }
                    '(' => depths.paren += 1,
                    ')' => {
                        depths.paren -= 1;
                        if depths.paren == 0 {
                            // End of the list finalizes the trailing argument.
                            self.finalize_argument(text, arg_start, pos, out);
                            return;
                        }
                    }
                    '[' => depths.bracket += 1,
                    ']' => depths.bracket = depths.bracket.saturating_sub(1),
                    '{' => depths.brace += 1,
                    '}' => depths.brace = depths.brace.saturating_sub(1),
                    ',' if depths.at_separator_level() => {
                        self.finalize_argument(text, arg_start, pos, out);
                        arg_start = pos + 1;
                    }
                    _ => {}
                },
            }
            pos += 1;
        }

        trace!(
            "{}: parameter list at {} never closes, dropping partial argument",
            self.grammar,
            list_start
        );
    }

    /// Emit the name range for one argument spanning `[start, end)`, or
    /// nothing if the argument is blank or has no recognizable name.
    fn finalize_argument(
        &self,
        text: &SourceText,
        start: usize,
        end: usize,
        out: &mut Vec<HighlightRange>,
    ) {
        if end <= start {
            return;
        }
        let raw = text.slice(start..end);
        if raw.trim().is_empty() {
            return;
        }

        // Nothing after a default-value `=` can hold the name. Any earlier
        // `=` would have to sit inside a nested literal, which cannot occur
        // before the marker itself.
        let prefix = match raw.find('=') {
            Some(idx) => &raw[..idx],
            None => raw,
        };

        let Some(caps) = self.name.captures(prefix) else {
            trace!("{}: no parameter name in {:?}", self.grammar, prefix);
            return;
        };
        let Some(name) = caps.get(1) else {
            return;
        };

        let lead_chars = prefix[..name.start()].chars().count();
        let name_chars = name.as_str().chars().count();
        let name_start = start + lead_chars;
        if let Some(range) = HighlightRange::new(name_start, name_start + name_chars) {
            out.push(range);
        }
    }
}

/// Compile a builtin pattern, degrading to a never-matching regex when it
/// is invalid so scanning stays total. The unit tests assert every builtin
/// pattern compiles.
fn compile(grammar: &str, pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => {
            error!(
                "{} scanner pattern {:?} failed to compile: {}",
                grammar, pattern, err
            );
            match Regex::new(NEVER_MATCHING) {
                Ok(re) => re,
                Err(_) => unreachable!("never-matching pattern is a valid regex"),
            }
        }
    }
}
