//! Message types for the pipeline's update loop
//!
//! All pipeline state changes flow through these message types.

use std::sync::Arc;

use crate::profile::SyntaxProfile;
use crate::range::Generation;
use crate::registry::ProfileSource;

/// Inputs to the pipeline state machine.
///
/// `ContentChanged` and `ProfileChanged` come from the embedder;
/// `DebounceElapsed` from the debounce timer; `ProfileResolved` from the
/// registry once a (possibly asynchronous) profile resolution finishes.
#[derive(Debug, Clone)]
pub enum Msg {
    /// The embedder's content changed; carries a full raw-text snapshot.
    ContentChanged { text: String },

    /// The embedder selected a different syntax profile. The current text
    /// re-tokenizes under the new profile even when it is unchanged.
    ProfileChanged { source: ProfileSource },

    /// The debounce window armed by trigger `seq` elapsed. Stale sequence
    /// numbers are dropped, collapsing bursts onto the latest snapshot.
    DebounceElapsed { seq: u64 },

    /// Profile resolution finished for run `generation`. Stale generations
    /// are discarded without ever being applied.
    ProfileResolved {
        generation: Generation,
        profile: Arc<SyntaxProfile>,
    },
}
