//! Pure pipeline state machine.
//!
//! [`update`] maps one message to the next state plus a command describing
//! the side effects to run; it never performs them itself. The runtime
//! (`pipeline::runtime`) owns the timer thread, the registry callbacks, and
//! the sink, and feeds the resulting messages back in.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::commands::Cmd;
use crate::extract::extract_all;
use crate::messages::Msg;
use crate::range::{Generation, HighlightResult};
use crate::registry::ProfileSource;
use crate::text::SourceText;

/// Debounce delay in milliseconds.
/// Kept short since the previously applied highlights stay visible while
/// the window is open.
pub const DEBOUNCE_MS: u64 = 30;

/// Where the pipeline is between messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing pending.
    Idle,
    /// A content snapshot waits for debounce window `seq` to elapse.
    Debouncing { seq: u64 },
    /// Run `generation` waits for its profile to resolve. Normalization,
    /// extraction, and apply happen synchronously once it does.
    Resolving { generation: Generation },
}

/// State carried across pipeline messages for one tokenizer instance.
#[derive(Debug)]
pub struct PipelineState {
    profile_source: ProfileSource,
    /// Latest raw snapshot awaiting its debounce window.
    pending_text: Option<String>,
    /// Normalized text of the run currently resolving its profile.
    in_flight_text: Option<SourceText>,
    /// Normalized text of the last successfully applied run, kept only to
    /// short-circuit no-op updates.
    last_applied_text: Option<SourceText>,
    last_result: Option<Arc<HighlightResult>>,
    seq: u64,
    generation: Generation,
    phase: Phase,
    debounce: Duration,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::with_profile(ProfileSource::Named("default".to_string()))
    }

    pub fn with_profile(source: ProfileSource) -> Self {
        Self {
            profile_source: source,
            pending_text: None,
            in_flight_text: None,
            last_applied_text: None,
            last_result: None,
            seq: 0,
            generation: 0,
            phase: Phase::Idle,
            debounce: Duration::from_millis(DEBOUNCE_MS),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Generation of the newest run. Only a `ProfileResolved` carrying
    /// exactly this value can apply.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn profile_source(&self) -> &ProfileSource {
        &self.profile_source
    }

    /// Result of the last applied run, if any.
    pub fn last_result(&self) -> Option<&Arc<HighlightResult>> {
        self.last_result.as_ref()
    }

    pub fn set_debounce_window(&mut self, window: Duration) {
        self.debounce = window;
    }

    /// Abandon the in-flight run, if any. Advancing the generation is what
    /// cancels it: its `ProfileResolved` will arrive stale.
    fn cancel_in_flight(&mut self) {
        if self.in_flight_text.take().is_some() {
            self.generation += 1;
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Advance the state machine by one message.
pub fn update(state: &mut PipelineState, msg: Msg) -> Cmd {
    match msg {
        Msg::ContentChanged { text } => {
            state.pending_text = Some(text);
            state.seq += 1;
            state.phase = Phase::Debouncing { seq: state.seq };
            Cmd::ArmDebounce {
                seq: state.seq,
                delay: state.debounce,
            }
        }

        Msg::ProfileChanged { source } => {
            state.profile_source = source;
            // Re-tokenize whatever text we know about: a pending snapshot,
            // the run in flight, or the already applied text.
            let snapshot = state
                .pending_text
                .take()
                .or_else(|| {
                    state
                        .in_flight_text
                        .as_ref()
                        .map(|text| text.as_str().to_string())
                })
                .or_else(|| {
                    state
                        .last_applied_text
                        .as_ref()
                        .map(|text| text.as_str().to_string())
                });
            state.cancel_in_flight();
            state.last_applied_text = None;
            match snapshot {
                Some(text) => {
                    state.pending_text = Some(text);
                    state.seq += 1;
                    state.phase = Phase::Debouncing { seq: state.seq };
                    // Immediate re-tokenization on a profile switch.
                    Cmd::ArmDebounce {
                        seq: state.seq,
                        delay: Duration::ZERO,
                    }
                }
                None => {
                    state.phase = Phase::Idle;
                    Cmd::None
                }
            }
        }

        Msg::DebounceElapsed { seq } => {
            if seq != state.seq {
                trace!(
                    "skipping stale debounce: window {} superseded by {}",
                    seq,
                    state.seq
                );
                return Cmd::None;
            }
            let Some(raw) = state.pending_text.take() else {
                state.phase = Phase::Idle;
                return Cmd::None;
            };

            let normalized = SourceText::new(&raw);
            if state.last_applied_text.as_ref() == Some(&normalized) {
                debug!("content unchanged after normalization, skipping run");
                state.cancel_in_flight();
                state.phase = Phase::Idle;
                return Cmd::None;
            }

            state.in_flight_text = Some(normalized);
            state.generation += 1;
            state.phase = Phase::Resolving {
                generation: state.generation,
            };
            Cmd::ResolveProfile {
                generation: state.generation,
                source: state.profile_source.clone(),
            }
        }

        Msg::ProfileResolved {
            generation,
            profile,
        } => {
            if generation != state.generation {
                debug!(
                    "discarding stale result: generation {} superseded by {}",
                    generation, state.generation
                );
                return Cmd::None;
            }
            let Some(text) = state.in_flight_text.take() else {
                debug!("profile resolved for a superseded run, discarding");
                return Cmd::None;
            };

            let result = Arc::new(extract_all(&profile, &text));
            state.last_applied_text = Some(text);
            state.last_result = Some(Arc::clone(&result));
            state.phase = Phase::Idle;
            Cmd::ApplyHighlights { result }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Rule, SyntaxProfile};
    use regex::Regex;

    fn word_profile() -> Arc<SyntaxProfile> {
        Arc::new(
            SyntaxProfile::new().with("word", Rule::Pattern(Regex::new(r"\w+").unwrap())),
        )
    }

    fn change(state: &mut PipelineState, text: &str) -> Cmd {
        update(
            state,
            Msg::ContentChanged {
                text: text.to_string(),
            },
        )
    }

    /// Drive one full run: content change, debounce, resolution.
    fn run_to_applied(state: &mut PipelineState, text: &str, profile: Arc<SyntaxProfile>) -> Cmd {
        change(state, text);
        let cmd = update(state, Msg::DebounceElapsed { seq: state.seq });
        let Cmd::ResolveProfile { generation, .. } = cmd else {
            panic!("expected a profile resolution, got {:?}", cmd);
        };
        update(
            state,
            Msg::ProfileResolved {
                generation,
                profile,
            },
        )
    }

    #[test]
    fn test_content_change_arms_debounce() {
        let mut state = PipelineState::new();
        let cmd = change(&mut state, "hello");
        assert!(matches!(cmd, Cmd::ArmDebounce { seq: 1, .. }));
        assert_eq!(state.phase(), Phase::Debouncing { seq: 1 });
    }

    #[test]
    fn test_burst_collapses_onto_latest_snapshot() {
        let mut state = PipelineState::new();
        change(&mut state, "a");
        change(&mut state, "ab");
        change(&mut state, "abc");

        // Earlier windows are stale; only the newest one runs.
        assert!(matches!(
            update(&mut state, Msg::DebounceElapsed { seq: 1 }),
            Cmd::None
        ));
        assert!(matches!(
            update(&mut state, Msg::DebounceElapsed { seq: 2 }),
            Cmd::None
        ));
        let cmd = update(&mut state, Msg::DebounceElapsed { seq: 3 });
        assert!(matches!(cmd, Cmd::ResolveProfile { generation: 1, .. }));
    }

    #[test]
    fn test_resolution_applies_and_records_text() {
        let mut state = PipelineState::new();
        let cmd = run_to_applied(&mut state, "one two", word_profile());
        let Cmd::ApplyHighlights { result } = cmd else {
            panic!("expected an apply, got {:?}", cmd);
        };
        assert_eq!(result.get("word").unwrap().len(), 2);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.last_result().is_some());
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut state = PipelineState::new();
        change(&mut state, "first");
        update(&mut state, Msg::DebounceElapsed { seq: 1 });
        assert_eq!(state.generation(), 1);

        // A newer run starts before generation 1 resolves.
        change(&mut state, "second");
        update(&mut state, Msg::DebounceElapsed { seq: 2 });
        assert_eq!(state.generation(), 2);

        let cmd = update(
            &mut state,
            Msg::ProfileResolved {
                generation: 1,
                profile: word_profile(),
            },
        );
        assert!(matches!(cmd, Cmd::None));
        assert!(state.last_result().is_none());

        // Generation 2 still applies normally afterwards.
        let cmd = update(
            &mut state,
            Msg::ProfileResolved {
                generation: 2,
                profile: word_profile(),
            },
        );
        assert!(matches!(cmd, Cmd::ApplyHighlights { .. }));
    }

    #[test]
    fn test_lower_generation_never_overwrites_applied_result() {
        let mut state = PipelineState::new();
        change(&mut state, "old");
        update(&mut state, Msg::DebounceElapsed { seq: 1 });
        change(&mut state, "new");
        update(&mut state, Msg::DebounceElapsed { seq: 2 });

        // Generation 2 resolves first and applies.
        update(
            &mut state,
            Msg::ProfileResolved {
                generation: 2,
                profile: word_profile(),
            },
        );
        let applied = Arc::clone(state.last_result().unwrap());

        // Generation 1 arrives late; the applied result must not change.
        let cmd = update(
            &mut state,
            Msg::ProfileResolved {
                generation: 1,
                profile: word_profile(),
            },
        );
        assert!(matches!(cmd, Cmd::None));
        assert!(Arc::ptr_eq(&applied, state.last_result().unwrap()));
    }

    #[test]
    fn test_identical_text_short_circuits() {
        let mut state = PipelineState::new();
        run_to_applied(&mut state, "same text", word_profile());

        change(&mut state, "same text");
        let seq = state.seq;
        let cmd = update(&mut state, Msg::DebounceElapsed { seq });
        assert!(matches!(cmd, Cmd::None));
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_crlf_variant_counts_as_identical() {
        let mut state = PipelineState::new();
        run_to_applied(&mut state, "a\nb", word_profile());

        change(&mut state, "a\r\nb");
        let seq = state.seq;
        let cmd = update(&mut state, Msg::DebounceElapsed { seq });
        assert!(matches!(cmd, Cmd::None));
    }

    #[test]
    fn test_profile_change_retokenizes_identical_text() {
        let mut state = PipelineState::new();
        run_to_applied(&mut state, "same text", word_profile());

        let cmd = update(
            &mut state,
            Msg::ProfileChanged {
                source: ProfileSource::from("php"),
            },
        );
        // Zero-delay window, so the switch takes effect immediately.
        let Cmd::ArmDebounce { seq, delay } = cmd else {
            panic!("expected a debounce, got {:?}", cmd);
        };
        assert_eq!(delay, Duration::ZERO);

        // The unchanged text runs again instead of short-circuiting.
        let cmd = update(&mut state, Msg::DebounceElapsed { seq });
        assert!(matches!(cmd, Cmd::ResolveProfile { .. }));
    }

    #[test]
    fn test_profile_change_with_no_text_is_a_noop() {
        let mut state = PipelineState::new();
        let cmd = update(
            &mut state,
            Msg::ProfileChanged {
                source: ProfileSource::from("php"),
            },
        );
        assert!(matches!(cmd, Cmd::None));
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_profile_change_cancels_run_in_flight() {
        let mut state = PipelineState::new();
        change(&mut state, "some text");
        update(&mut state, Msg::DebounceElapsed { seq: 1 });
        let stale_generation = state.generation();

        update(
            &mut state,
            Msg::ProfileChanged {
                source: ProfileSource::from("php"),
            },
        );

        // The superseded run resolves late and is discarded.
        let cmd = update(
            &mut state,
            Msg::ProfileResolved {
                generation: stale_generation,
                profile: word_profile(),
            },
        );
        assert!(matches!(cmd, Cmd::None));
        assert!(state.last_result().is_none());

        // The re-armed run still carries the text forward.
        let seq = state.seq;
        let cmd = update(&mut state, Msg::DebounceElapsed { seq });
        assert!(matches!(cmd, Cmd::ResolveProfile { .. }));
    }
}
