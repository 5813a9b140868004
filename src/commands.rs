//! Command types for the pipeline's update loop
//!
//! Commands represent side effects that should be performed after an
//! update step; the pure state machine only describes them.

use std::sync::Arc;
use std::time::Duration;

use crate::range::{Generation, HighlightResult};
use crate::registry::ProfileSource;

/// Side effects requested by [`pipeline::update`](crate::pipeline::update).
#[derive(Debug, Clone, Default)]
pub enum Cmd {
    /// Nothing to do.
    #[default]
    None,

    /// (Re-)arm the debounce timer for trigger `seq`, replacing any
    /// pending deadline.
    ArmDebounce { seq: u64, delay: Duration },

    /// Resolve the active profile for run `generation` via the registry.
    ResolveProfile {
        generation: Generation,
        source: ProfileSource,
    },

    /// Push a freshly extracted result to the highlight sink.
    ApplyHighlights { result: Arc<HighlightResult> },
}
