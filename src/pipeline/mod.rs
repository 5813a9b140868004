//! Reactive tokenization pipeline.
//!
//! Flow for one run:
//!
//! ```text
//! ContentChanged / ProfileChanged
//!   -> ArmDebounce            (timer thread posts DebounceElapsed)
//!   -> normalize, short-circuit if text unchanged
//!   -> ResolveProfile         (registry worker posts ProfileResolved)
//!   -> extract_all
//!   -> ApplyHighlights        (clear sink, register in declaration order)
//! ```
//!
//! `state` is the pure message-to-command step; `runtime` owns the timer
//! thread, the registry callbacks, and the sink, and loops the resulting
//! messages back in. A stale `DebounceElapsed` or `ProfileResolved` (older
//! `seq` or generation than the newest run) is discarded without side
//! effects, which is the only cancellation mechanism: in-flight loads are
//! never interrupted, their results just arrive too late to matter.

mod runtime;
mod state;

pub use runtime::Highlighter;
pub use state::{update, Phase, PipelineState, DEBOUNCE_MS};
