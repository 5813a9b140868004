//! Syntax profiles: ordered token-type rules for one grammar.
//!
//! A profile maps token type names ("keyword", "string", "argument") to
//! rules. Declaration order is meaningful and preserved exactly as
//! authored: a type declared later wins over an earlier one wherever their
//! ranges overlap (see `layering`). Re-sorting a profile changes rendering
//! output.
//!
//! Profile documents are YAML mappings (see `profiles/` for the builtin
//! set):
//!
//! ```yaml
//! keyword: [function, return, if, else]   # word list → whole-word matches
//! string: "\"(?:[^\"\\\\]|\\\\.)*\""      # string → regex pattern
//! argument: { scanner: php-arguments }    # named procedural scanner
//! deleted: ~                              # null → inert (reserves a slot)
//! ```
//!
//! Profile loading priority for bare identifiers:
//! 1. User config: `~/.config/tint/syntax.{id}.yaml`
//! 2. Embedded: built-in profiles compiled into the binary

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_yaml::Value;
use tracing::{error, warn};

use crate::error::{ProfileError, ScanError};
use crate::range::HighlightRange;
use crate::scanner::ArgumentScanner;
use crate::text::SourceText;

// Embed profile YAML files at compile time
pub const DEFAULT_PROFILE_YAML: &str = include_str!("../profiles/syntax.default.yaml");
pub const PHP_PROFILE_YAML: &str = include_str!("../profiles/syntax.php.yaml");
pub const PYTHON_PROFILE_YAML: &str = include_str!("../profiles/syntax.python.yaml");
pub const JAVASCRIPT_PROFILE_YAML: &str = include_str!("../profiles/syntax.javascript.yaml");

/// A built-in profile entry
pub struct BuiltinProfile {
    /// Stable identifier (e.g. "php", "python")
    pub id: &'static str,
    /// Embedded YAML content
    pub yaml: &'static str,
}

/// Registry of all built-in profiles
pub const BUILTIN_PROFILES: &[BuiltinProfile] = &[
    BuiltinProfile {
        id: "default",
        yaml: DEFAULT_PROFILE_YAML,
    },
    BuiltinProfile {
        id: "php",
        yaml: PHP_PROFILE_YAML,
    },
    BuiltinProfile {
        id: "python",
        yaml: PYTHON_PROFILE_YAML,
    },
    BuiltinProfile {
        id: "javascript",
        yaml: JAVASCRIPT_PROFILE_YAML,
    },
];

/// Look up a builtin profile by identifier.
pub fn builtin_profile(id: &str) -> Option<&'static BuiltinProfile> {
    BUILTIN_PROFILES.iter().find(|builtin| builtin.id == id)
}

/// Procedural extraction rule: takes the pass's text, returns ranges in
/// scan order. A returned error is logged and the rule contributes nothing
/// for that pass.
pub type ScannerFn =
    Arc<dyn Fn(&SourceText) -> Result<Vec<HighlightRange>, ScanError> + Send + Sync>;

/// One way of turning text into ranges for a token type.
#[derive(Clone)]
pub enum Rule {
    /// Regex applied in find-all-non-overlapping mode.
    Pattern(Regex),
    /// Whole-word literal alternation, compiled once.
    Keywords(KeywordSet),
    /// Procedural scanner (the argument scanner is the canonical instance).
    Scanner(ScannerFn),
    /// Declared but produces nothing; reserves the slot.
    Inert,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Rule::Keywords(set) => f.debug_tuple("Keywords").field(&set.words()).finish(),
            Rule::Scanner(_) => f.write_str("Scanner(..)"),
            Rule::Inert => f.write_str("Inert"),
        }
    }
}

/// Deduplicated keyword list compiled into one whole-word alternation.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    words: Vec<String>,
    pattern: Regex,
}

impl KeywordSet {
    /// Compile a word list. Duplicates collapse onto their first occurrence
    /// and empty entries are dropped; an empty list matches nothing. Word
    /// boundaries are asserted only on sides that start or end with an
    /// identifier char, so punctuation keywords match literally.
    pub fn compile<I, S>(words: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() || deduped.iter().any(|seen| seen == word) {
                continue;
            }
            deduped.push(word.to_string());
        }

        // Longest first so no alternative shadows a longer one it prefixes.
        let mut ordered: Vec<&String> = deduped.iter().collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let pattern = if ordered.is_empty() {
            NEVER_MATCHING.to_string()
        } else {
            let alternatives: Vec<String> =
                ordered.iter().map(|word| word_pattern(word)).collect();
            alternatives.join("|")
        };

        Ok(Self {
            words: deduped,
            pattern: Regex::new(&pattern)?,
        })
    }

    /// The words in this set, in authored order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.pattern
    }
}

/// A character class that excludes everything; cannot match.
pub(crate) const NEVER_MATCHING: &str = r"[^\s\S]";

fn word_pattern(word: &str) -> String {
    let mut pattern = String::new();
    if word.chars().next().is_some_and(is_ident_char) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(word));
    if word.chars().last().is_some_and(is_ident_char) {
        pattern.push_str(r"\b");
    }
    pattern
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Named entry in a profile.
#[derive(Debug, Clone)]
pub struct ProfileEntry {
    pub name: String,
    pub rule: Rule,
}

/// An ordered mapping of token type names to rules.
#[derive(Debug, Clone, Default)]
pub struct SyntaxProfile {
    entries: Vec<ProfileEntry>,
}

impl SyntaxProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[ProfileEntry] {
        &self.entries
    }

    /// Number of declared token types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rule for one token type.
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.rule)
    }

    /// Append a token type. Returns false (keeping the existing entry) when
    /// the name is already declared; first declaration wins.
    pub fn push(&mut self, name: impl Into<String>, rule: Rule) -> bool {
        let name = name.into();
        if self.entries.iter().any(|entry| entry.name == name) {
            return false;
        }
        self.entries.push(ProfileEntry { name, rule });
        true
    }

    /// Chainable `push` for literal profiles.
    pub fn with(mut self, name: impl Into<String>, rule: Rule) -> Self {
        let name = name.into();
        if !self.push(name.clone(), rule) {
            warn!("duplicate token type '{}' ignored", name);
        }
        self
    }

    /// Parse a YAML profile document.
    ///
    /// The document root must be a mapping; its key order becomes the
    /// declaration order. Malformed entries (unrecognized rule shapes,
    /// invalid regexes, unknown scanner names) degrade to `Rule::Inert`
    /// with a logged diagnostic instead of failing the whole profile.
    pub fn from_yaml(doc: &str, scanners: &ScannerTable) -> Result<Self, ProfileError> {
        let root: Value = serde_yaml::from_str(doc)?;
        let mapping = match root {
            Value::Mapping(mapping) => mapping,
            // An empty document is a valid zero-rule profile.
            Value::Null => return Ok(Self::new()),
            _ => return Err(ProfileError::NotAMapping),
        };

        let mut profile = Self::new();
        for (key, value) in mapping {
            let name = match key {
                Value::String(name) => name,
                other => {
                    warn!("ignoring profile entry with non-string key {:?}", other);
                    continue;
                }
            };
            let rule = parse_rule(&name, value, scanners).unwrap_or(Rule::Inert);
            if !profile.push(name.clone(), rule) {
                warn!("duplicate token type '{}' ignored", name);
            }
        }
        Ok(profile)
    }
}

/// Parse one rule value. `None` means the entry was malformed; a diagnostic
/// naming the token type has already been logged.
fn parse_rule(name: &str, value: Value, scanners: &ScannerTable) -> Option<Rule> {
    match value {
        Value::Null => Some(Rule::Inert),

        Value::String(pattern) => match Regex::new(&pattern) {
            Ok(re) => Some(Rule::Pattern(re)),
            Err(err) => {
                warn!("token type '{}': invalid pattern: {}", name, err);
                None
            }
        },

        Value::Sequence(items) => {
            let mut words = Vec::with_capacity(items.len());
            for item in &items {
                match item {
                    Value::String(word) => words.push(word.clone()),
                    other => {
                        warn!(
                            "token type '{}': keyword entries must be strings, got {:?}",
                            name, other
                        );
                        return None;
                    }
                }
            }
            match KeywordSet::compile(&words) {
                Ok(set) => Some(Rule::Keywords(set)),
                Err(err) => {
                    warn!("token type '{}': keyword list failed to compile: {}", name, err);
                    None
                }
            }
        }

        Value::Mapping(map) => {
            match map.get("scanner") {
                Some(Value::String(scanner_name)) => match scanners.get(scanner_name) {
                    Some(scanner) => Some(Rule::Scanner(scanner)),
                    None => {
                        warn!("token type '{}': unknown scanner '{}'", name, scanner_name);
                        None
                    }
                },
                _ => {
                    warn!("token type '{}': unrecognized rule mapping", name);
                    None
                }
            }
        }

        other => {
            warn!("token type '{}': unrecognized rule value {:?}", name, other);
            None
        }
    }
}

/// Named scanners available to `{scanner: name}` profile entries.
#[derive(Clone, Default)]
pub struct ScannerTable {
    entries: HashMap<String, ScannerFn>,
}

impl ScannerTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with the builtin argument scanners.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register("php-arguments", ArgumentScanner::php().into_scanner_fn());
        table.register(
            "python-arguments",
            ArgumentScanner::python().into_scanner_fn(),
        );
        table.register(
            "javascript-arguments",
            ArgumentScanner::javascript().into_scanner_fn(),
        );
        table
    }

    /// Add or replace a named scanner.
    pub fn register(&mut self, name: impl Into<String>, scanner: ScannerFn) {
        self.entries.insert(name.into(), scanner);
    }

    /// Shared handle to a named scanner.
    pub fn get(&self, name: &str) -> Option<ScannerFn> {
        self.entries.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for ScannerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerTable")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The fallback profile used whenever a load fails: the embedded default
/// document, or an empty profile should that ever fail to parse.
pub fn default_profile(scanners: &ScannerTable) -> SyntaxProfile {
    match SyntaxProfile::from_yaml(DEFAULT_PROFILE_YAML, scanners) {
        Ok(profile) => profile,
        Err(err) => {
            error!("builtin default profile failed to parse: {}", err);
            SyntaxProfile::new()
        }
    }
}
