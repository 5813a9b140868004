//! Highlight range primitives.
//!
//! Ranges are half-open `[start, end)` char offset spans with `end > start`
//! strictly; zero-length spans cannot be constructed and are dropped
//! wherever they would arise.

/// Monotonic tag for tokenization runs.
///
/// Each pipeline run gets a fresh generation; async results carrying an
/// older generation than the newest run are discarded instead of applied.
pub type Generation = u64;

/// A half-open char offset span attributed to one token type.
///
/// The fields are public for pattern matching and struct-literal
/// construction in scanners; only [`new`](Self::new) checks `end > start`,
/// and literal-built ranges are bounds-checked by the extraction engine
/// before they enter a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HighlightRange {
    /// Start offset (0-indexed, inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl HighlightRange {
    /// Build a range; `None` for zero-length or inverted spans.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        if end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Number of chars covered.
    pub fn len_chars(&self) -> usize {
        self.end - self.start
    }

    /// Whether `offset` falls inside this range.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Whether the two ranges share at least one position.
    pub fn overlaps(&self, other: &HighlightRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Per-type ranges for one tokenization pass, in profile declaration order.
///
/// The entry order is the layering priority: a type appearing later wins at
/// positions where its ranges overlap an earlier type's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightResult {
    entries: Vec<(String, Vec<HighlightRange>)>,
}

impl HighlightResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one token type's ranges. Callers are responsible for keeping
    /// declaration order.
    pub fn push(&mut self, type_name: impl Into<String>, ranges: Vec<HighlightRange>) {
        self.entries.push((type_name.into(), ranges));
    }

    /// Ranges for one token type, if the profile declared it.
    pub fn get(&self, type_name: &str) -> Option<&[HighlightRange]> {
        self.entries
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, ranges)| ranges.as_slice())
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HighlightRange])> {
        self.entries
            .iter()
            .map(|(name, ranges)| (name.as_str(), ranges.as_slice()))
    }

    /// Number of declared token types (including ones with no ranges).
    pub fn type_count(&self) -> usize {
        self.entries.len()
    }

    /// Total ranges across all types.
    pub fn range_count(&self) -> usize {
        self.entries.iter().map(|(_, ranges)| ranges.len()).sum()
    }

    /// True when no type produced any range.
    pub fn is_empty(&self) -> bool {
        self.range_count() == 0
    }
}
