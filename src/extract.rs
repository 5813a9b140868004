//! Token range extraction: run profile rules against a text.
//!
//! Each rule resolves independently to a list of char-offset ranges, and a
//! failing rule degrades to an empty list instead of poisoning the result.
//! Pattern and keyword rules emit ranges in ascending order without
//! overlap; scanner rules emit in whatever order the scanner produced,
//! bounds-checked against the text.

use std::time::Instant;

use regex::Regex;
use tracing::{debug, warn};

use crate::profile::{Rule, SyntaxProfile};
use crate::range::{HighlightRange, HighlightResult};
use crate::text::SourceText;

/// Ranges matched by one rule. Never fails: rule errors are logged and
/// contribute nothing.
pub fn extract(rule: &Rule, text: &SourceText) -> Vec<HighlightRange> {
    match rule {
        Rule::Pattern(regex) => extract_pattern(regex, text),
        Rule::Keywords(set) => extract_pattern(set.regex(), text),
        Rule::Scanner(scan) => match scan(text) {
            Ok(ranges) => sanitize(ranges, text),
            Err(err) => {
                warn!("scanner failed, contributing no ranges: {}", err);
                Vec::new()
            }
        },
        Rule::Inert => Vec::new(),
    }
}

/// All non-overlapping matches of `regex`, converted to char offsets.
/// Zero-length matches are dropped.
pub fn extract_pattern(regex: &Regex, text: &SourceText) -> Vec<HighlightRange> {
    let mut ranges = Vec::new();
    for found in regex.find_iter(text.as_str()) {
        if found.start() == found.end() {
            continue;
        }
        let start = text.byte_to_char(found.start());
        let end = text.byte_to_char(found.end());
        if let Some(range) = HighlightRange::new(start, end) {
            ranges.push(range);
        }
    }
    ranges
}

/// Drop scanner-produced ranges that are inverted or fall outside the text.
fn sanitize(ranges: Vec<HighlightRange>, text: &SourceText) -> Vec<HighlightRange> {
    let len = text.len_chars();
    ranges
        .into_iter()
        .filter(|range| {
            let ok = range.end > range.start && range.end <= len;
            if !ok {
                warn!(
                    "dropping out-of-bounds scanner range {}..{} (text is {} chars)",
                    range.start, range.end, len
                );
            }
            ok
        })
        .collect()
}

/// Run every rule of `profile` over `text`, producing one entry per token
/// type in declaration order. Rules that match nothing still get an entry,
/// so a result always mirrors its profile's shape.
pub fn extract_all(profile: &SyntaxProfile, text: &SourceText) -> HighlightResult {
    let started = Instant::now();
    let mut result = HighlightResult::new();
    for entry in profile.entries() {
        result.push(entry.name.clone(), extract(&entry.rule, text));
    }
    debug!(
        "extracted {} ranges across {} token types in {:?}",
        result.range_count(),
        result.type_count(),
        started.elapsed()
    );
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ScanError;
    use crate::profile::KeywordSet;

    fn pattern_rule(pattern: &str) -> Rule {
        Rule::Pattern(Regex::new(pattern).unwrap())
    }

    #[test]
    fn test_pattern_matches_are_sorted_and_disjoint() {
        let text = SourceText::new("one two three two");
        let ranges = extract(&pattern_rule(r"\btwo\b"), &text);
        assert_eq!(ranges.len(), 2);
        assert!(ranges[0].end <= ranges[1].start, "matches must not overlap");
        assert_eq!(text.slice(ranges[0].start..ranges[0].end), "two");
        assert_eq!(text.slice(ranges[1].start..ranges[1].end), "two");
    }

    #[test]
    fn test_zero_length_matches_are_dropped() {
        let text = SourceText::new("axb");
        // `x*` matches empty at every position; only the real `x` survives.
        let ranges = extract(&pattern_rule("x*"), &text);
        assert_eq!(ranges.len(), 1);
        assert_eq!((ranges[0].start, ranges[0].end), (1, 2));

        let boundaries = extract(&pattern_rule(r"\b"), &text);
        assert!(boundaries.is_empty(), "pure boundaries are all zero-length");
    }

    #[test]
    fn test_keyword_rule_respects_word_boundaries() {
        let set = KeywordSet::compile(["if", "in"]).unwrap();
        let text = SourceText::new("if inif in");
        let ranges = extract(&Rule::Keywords(set), &text);
        let words: Vec<&str> = ranges
            .iter()
            .map(|r| text.slice(r.start..r.end))
            .collect();
        assert_eq!(words, vec!["if", "in"]);
    }

    #[test]
    fn test_scanner_failure_contributes_nothing() {
        let rule = Rule::Scanner(Arc::new(|_: &SourceText| {
            Err(ScanError::new("deliberate failure"))
        }));
        let text = SourceText::new("function f($a)");
        assert!(extract(&rule, &text).is_empty());
    }

    #[test]
    fn test_out_of_bounds_scanner_ranges_are_dropped() {
        let rule = Rule::Scanner(Arc::new(|_: &SourceText| {
            Ok(vec![
                HighlightRange { start: 0, end: 2 },
                HighlightRange { start: 1, end: 999 },
                HighlightRange { start: 5, end: 5 },
            ])
        }));
        let text = SourceText::new("abcdef");
        let ranges = extract(&rule, &text);
        assert_eq!(ranges, vec![HighlightRange { start: 0, end: 2 }]);
    }

    #[test]
    fn test_inert_rule_is_silent() {
        let text = SourceText::new("anything at all");
        assert!(extract(&Rule::Inert, &text).is_empty());
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let text = SourceText::new("héllo é");
        let ranges = extract(&pattern_rule("é+"), &text);
        assert_eq!(ranges.len(), 2);
        assert_eq!((ranges[0].start, ranges[0].end), (1, 2));
        assert_eq!((ranges[1].start, ranges[1].end), (6, 7));
    }

    #[test]
    fn test_extract_all_preserves_declaration_order() {
        let profile = SyntaxProfile::new()
            .with("comment", pattern_rule("//[^\n]*"))
            .with("number", pattern_rule(r"\d+"));
        let text = SourceText::new("// note 42\n7");
        let result = extract_all(&profile, &text);
        let names: Vec<&str> = result.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["comment", "number"]);
        // The comment swallows the 42; only the trailing 7 is a number.
        assert_eq!(result.get("number").unwrap().len(), 1);
    }

    #[test]
    fn test_extract_all_keeps_entries_for_silent_rules() {
        let profile = SyntaxProfile::new()
            .with("never", pattern_rule("zzz9zzz"))
            .with("inert", Rule::Inert);
        let result = extract_all(&profile, &SourceText::new("plain text"));
        assert_eq!(result.type_count(), 2);
        assert_eq!(result.range_count(), 0);
        assert!(result.is_empty());
    }
}
