//! Highlight layering: hand a result to a sink with deterministic
//! precedence.
//!
//! A profile's declaration order doubles as its layering order. [`apply`]
//! keeps the contract simple for sinks that layer internally: clear
//! everything, then register each token type's ranges in declaration order
//! so later registrations paint over earlier ones. Running the same result
//! twice leaves the sink in the same state it reached after the first run.
//!
//! Sinks without their own compositing use [`resolve_winners`] instead,
//! which flattens a result into non-overlapping spans where the
//! later-declared type wins every contested segment.

use tracing::debug;

use crate::range::{HighlightRange, HighlightResult};

/// Receiver for resolved highlights. Implemented by whatever owns the
/// visual (or recorded) highlight state.
pub trait HighlightSink {
    /// Drop every previously registered range, for all token types.
    fn clear_all(&mut self);

    /// Accept the ranges for one token type. Called in declaration order,
    /// after `clear_all`, for types with at least one range.
    fn register(&mut self, type_name: &str, ranges: &[HighlightRange]);
}

/// Push `result` into `sink`: clear, then register non-empty types in
/// declaration order.
pub fn apply(result: &HighlightResult, sink: &mut dyn HighlightSink) {
    sink.clear_all();
    let mut registered = 0usize;
    for (name, ranges) in result.iter() {
        if ranges.is_empty() {
            continue;
        }
        sink.register(name, ranges);
        registered += 1;
    }
    debug!(
        "applied {} of {} token types ({} ranges)",
        registered,
        result.type_count(),
        result.range_count()
    );
}

/// One flattened span: `range` belongs to exactly one winning token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSpan<'a> {
    pub type_name: &'a str,
    pub range: HighlightRange,
}

/// Point-coverage index for one token type's ranges. Ranges may arrive
/// unsorted and overlapping (scanners make no ordering promise), so lookups
/// go through a sorted copy with prefix-max ends.
struct TypeCoverage {
    starts: Vec<usize>,
    max_end: Vec<usize>,
}

impl TypeCoverage {
    fn build(ranges: &[HighlightRange]) -> Self {
        let mut sorted = ranges.to_vec();
        sorted.sort_unstable_by_key(|range| (range.start, range.end));
        let mut starts = Vec::with_capacity(sorted.len());
        let mut max_end = Vec::with_capacity(sorted.len());
        let mut running = 0;
        for range in &sorted {
            starts.push(range.start);
            running = running.max(range.end);
            max_end.push(running);
        }
        Self { starts, max_end }
    }

    fn covers(&self, point: usize) -> bool {
        let idx = self.starts.partition_point(|&start| start <= point);
        idx > 0 && self.max_end[idx - 1] > point
    }
}

/// Flatten `result` into sorted, non-overlapping spans. Boundaries are cut
/// wherever any range starts or ends; each segment goes to the last
/// declared type covering it, and adjacent segments with the same winner
/// merge back into one span. Segments no type covers produce nothing.
pub fn resolve_winners(result: &HighlightResult) -> Vec<ResolvedSpan<'_>> {
    let mut boundaries: Vec<usize> = Vec::new();
    let mut coverages: Vec<(&str, TypeCoverage)> = Vec::new();
    for (name, ranges) in result.iter() {
        if ranges.is_empty() {
            continue;
        }
        for range in ranges {
            boundaries.push(range.start);
            boundaries.push(range.end);
        }
        coverages.push((name, TypeCoverage::build(ranges)));
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut spans: Vec<ResolvedSpan<'_>> = Vec::new();
    for pair in boundaries.windows(2) {
        let (seg_start, seg_end) = (pair[0], pair[1]);
        // Boundaries cut at every range edge, so covering the segment start
        // means covering the whole segment. Later declarations win.
        let winner = coverages
            .iter()
            .rev()
            .find(|(_, coverage)| coverage.covers(seg_start))
            .map(|(name, _)| *name);
        let Some(name) = winner else {
            continue;
        };
        if let Some(last) = spans.last_mut() {
            if last.type_name == name && last.range.end == seg_start {
                last.range.end = seg_end;
                continue;
            }
        }
        if let Some(range) = HighlightRange::new(seg_start, seg_end) {
            spans.push(ResolvedSpan {
                type_name: name,
                range,
            });
        }
    }
    spans
}
