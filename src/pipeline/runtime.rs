//! Pipeline runtime: channels, debounce timer, command execution.
//!
//! [`Highlighter`] owns the state machine and runs its commands. All state
//! transitions happen on the caller's thread inside `update`; the timer
//! thread and the registry's load workers only post messages back over the
//! channel. Callers drain that channel with [`process_messages`]
//! (`Highlighter::process_messages`) from their own loop, or use
//! [`run_until_idle`](Highlighter::run_until_idle) to block until the
//! pipeline settles.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::commands::Cmd;
use crate::layering::{self, HighlightSink};
use crate::messages::Msg;
use crate::pipeline::state::{self, Phase, PipelineState};
use crate::range::HighlightResult;
use crate::registry::{ProfileRegistry, ProfileSource};

use std::sync::Arc;

/// Reactive tokenizer instance: debounces content changes, resolves the
/// profile, extracts ranges, and pushes results into its sink.
pub struct Highlighter {
    state: PipelineState,
    sink: Box<dyn HighlightSink>,
    registry: ProfileRegistry,
    msg_tx: Sender<Msg>,
    msg_rx: Receiver<Msg>,
    timer_tx: Sender<(u64, Duration)>,
}

impl Highlighter {
    /// Highlighter over a fresh registry (builtin profiles and scanners).
    pub fn new(sink: Box<dyn HighlightSink>) -> Self {
        Self::with_registry(sink, ProfileRegistry::new())
    }

    /// Highlighter sharing an existing registry's cache.
    pub fn with_registry(sink: Box<dyn HighlightSink>, registry: ProfileRegistry) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        let (timer_tx, timer_rx) = mpsc::channel();
        spawn_debounce_timer(timer_rx, msg_tx.clone());
        Self {
            state: PipelineState::new(),
            sink,
            registry,
            msg_tx,
            msg_rx,
            timer_tx,
        }
    }

    /// Shorten or lengthen the debounce window (default
    /// [`DEBOUNCE_MS`](crate::pipeline::DEBOUNCE_MS)).
    pub fn set_debounce_window(&mut self, window: Duration) {
        self.state.set_debounce_window(window);
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Result of the last applied tokenization pass.
    pub fn last_result(&self) -> Option<&Arc<HighlightResult>> {
        self.state.last_result()
    }

    /// Notify the pipeline that the content changed. Returns true if the
    /// change was applied synchronously (it never is; the debounce window
    /// must elapse first).
    pub fn notify_change(&mut self, text: &str) -> bool {
        self.dispatch(Msg::ContentChanged {
            text: text.to_string(),
        })
    }

    /// Switch the active syntax profile; the current text re-tokenizes
    /// under it immediately.
    pub fn set_profile(&mut self, source: impl Into<ProfileSource>) -> bool {
        self.dispatch(Msg::ProfileChanged {
            source: source.into(),
        })
    }

    /// Drain every message the timer and load workers have posted.
    /// Returns true if any pass was applied to the sink.
    pub fn process_messages(&mut self) -> bool {
        let mut applied = false;
        while let Ok(msg) = self.msg_rx.try_recv() {
            applied |= self.dispatch(msg);
        }
        applied
    }

    /// Block until the pipeline reaches `Idle` or `timeout` passes.
    /// Returns true if any pass was applied along the way.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut applied = self.process_messages();
        while self.state.phase() != Phase::Idle {
            let now = Instant::now();
            if now >= deadline {
                warn!("pipeline did not settle within {:?}", timeout);
                break;
            }
            match self.msg_rx.recv_timeout(deadline - now) {
                Ok(msg) => {
                    applied |= self.dispatch(msg);
                    applied |= self.process_messages();
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!("pipeline did not settle within {:?}", timeout);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        applied
    }

    fn dispatch(&mut self, msg: Msg) -> bool {
        let cmd = state::update(&mut self.state, msg);
        self.run_cmd(cmd)
    }

    fn run_cmd(&mut self, cmd: Cmd) -> bool {
        match cmd {
            Cmd::None => false,
            Cmd::ArmDebounce { seq, delay } => {
                if self.timer_tx.send((seq, delay)).is_err() {
                    // Timer thread is gone; elapse the window inline so the
                    // pipeline cannot stall.
                    let _ = self.msg_tx.send(Msg::DebounceElapsed { seq });
                }
                false
            }
            Cmd::ResolveProfile { generation, source } => {
                let tx = self.msg_tx.clone();
                self.registry.resolve_with(
                    source,
                    Box::new(move |profile| {
                        let _ = tx.send(Msg::ProfileResolved {
                            generation,
                            profile,
                        });
                    }),
                );
                false
            }
            Cmd::ApplyHighlights { result } => {
                layering::apply(&result, self.sink.as_mut());
                true
            }
        }
    }
}

/// One timer thread per highlighter. Arming replaces the pending deadline,
/// which is what collapses a burst of triggers onto the newest one. The
/// thread exits when the control channel disconnects (highlighter drop).
fn spawn_debounce_timer(control: Receiver<(u64, Duration)>, tx: Sender<Msg>) {
    std::thread::spawn(move || {
        let mut pending: Option<(u64, Instant)> = None;
        loop {
            match pending {
                None => match control.recv() {
                    Ok((seq, delay)) => pending = Some((seq, Instant::now() + delay)),
                    Err(_) => return,
                },
                Some((seq, deadline)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        let _ = tx.send(Msg::DebounceElapsed { seq });
                        pending = None;
                        continue;
                    }
                    match control.recv_timeout(deadline - now) {
                        Ok((new_seq, delay)) => {
                            pending = Some((new_seq, Instant::now() + delay));
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            let _ = tx.send(Msg::DebounceElapsed { seq });
                            pending = None;
                        }
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
            }
        }
    });
}
