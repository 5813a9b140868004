//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use tint::error::ProfileError;
use tint::layering::HighlightSink;
use tint::pipeline::Highlighter;
use tint::profile::{Rule, SyntaxProfile};
use tint::range::HighlightRange;
use tint::registry::{ProfileLoader, ProfileLocation};

/// One sink call, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Clear,
    Register(String, Vec<HighlightRange>),
}

/// Sink that records every call; cloned handles share one event log, so a
/// clone can be moved into a `Highlighter` while the test keeps another.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// Number of applied passes (each pass starts with one clear).
    pub fn applied_passes(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, SinkEvent::Clear))
            .count()
    }

    /// Type names registered since the last clear, in registration order.
    pub fn current_names(&self) -> Vec<String> {
        let events = self.events.lock();
        let after_clear = events
            .iter()
            .rposition(|event| matches!(event, SinkEvent::Clear))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        events[after_clear..]
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Register(name, _) => Some(name.clone()),
                SinkEvent::Clear => None,
            })
            .collect()
    }

    /// Whether any pass ever registered this type name.
    pub fn ever_registered(&self, type_name: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|event| matches!(event, SinkEvent::Register(name, _) if name == type_name))
    }
}

impl HighlightSink for RecordingSink {
    fn clear_all(&mut self) {
        self.events.lock().push(SinkEvent::Clear);
    }

    fn register(&mut self, type_name: &str, ranges: &[HighlightRange]) {
        self.events
            .lock()
            .push(SinkEvent::Register(type_name.to_string(), ranges.to_vec()));
    }
}

struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    fn closed() -> Self {
        Self {
            open: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    fn wait(&self) {
        let mut open = self.open.lock();
        self.cv.wait_while(&mut open, |open| !*open);
    }

    fn release(&self) {
        *self.open.lock() = true;
        self.cv.notify_all();
    }
}

/// Loader backed by staged in-memory documents. Gated identifiers block
/// inside `load` until the test releases them, which is how resolution
/// order is scripted; per-identifier load counts expose coalescing.
#[derive(Default)]
pub struct GatedLoader {
    docs: Mutex<HashMap<String, String>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
    counts: Mutex<HashMap<String, usize>>,
}

impl GatedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the document returned for an identifier.
    pub fn stage(&self, id: &str, yaml: &str) {
        self.docs.lock().insert(id.to_string(), yaml.to_string());
    }

    /// Make loads of `id` block until [`release`](Self::release).
    pub fn gate(&self, id: &str) {
        self.gates
            .lock()
            .insert(id.to_string(), Arc::new(Gate::closed()));
    }

    pub fn release(&self, id: &str) {
        if let Some(gate) = self.gates.lock().get(id) {
            gate.release();
        }
    }

    /// How many loads reached this identifier (including blocked ones).
    pub fn load_count(&self, id: &str) -> usize {
        self.counts.lock().get(id).copied().unwrap_or(0)
    }

    fn key(location: &ProfileLocation) -> String {
        match location {
            ProfileLocation::Url(url) => url.clone(),
            ProfileLocation::File(path) => path.display().to_string(),
            ProfileLocation::Conventional { id, .. } => id.clone(),
        }
    }
}

impl ProfileLoader for GatedLoader {
    fn load(&self, location: &ProfileLocation) -> Result<String, ProfileError> {
        let key = Self::key(location);
        *self.counts.lock().entry(key.clone()).or_insert(0) += 1;

        let gate = self.gates.lock().get(&key).cloned();
        if let Some(gate) = gate {
            gate.wait();
        }

        self.docs
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| ProfileError::UnsupportedLocation(key))
    }
}

/// Literal two-type profile with overlapping matches, for layering tests:
/// `tag` covers `<...>` elements, `string` covers quoted attributes inside
/// them.
pub fn tag_then_string_profile() -> SyntaxProfile {
    SyntaxProfile::new()
        .with("tag", pattern_rule("<[^>]*>"))
        .with("string", pattern_rule("\"[^\"]*\""))
}

/// Same rules with reversed declaration order.
pub fn string_then_tag_profile() -> SyntaxProfile {
    SyntaxProfile::new()
        .with("string", pattern_rule("\"[^\"]*\""))
        .with("tag", pattern_rule("<[^>]*>"))
}

pub fn pattern_rule(pattern: &str) -> Rule {
    Rule::Pattern(regex::Regex::new(pattern).unwrap())
}

/// Pump the highlighter's message loop until `predicate` holds or the
/// timeout passes. Panics on timeout: every caller treats the condition as
/// a hard expectation.
pub fn wait_for(
    highlighter: &mut Highlighter,
    timeout: Duration,
    mut predicate: impl FnMut(&Highlighter) -> bool,
) {
    let deadline = Instant::now() + timeout;
    loop {
        highlighter.process_messages();
        if predicate(highlighter) {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "condition not reached within {:?}",
            timeout
        );
        std::thread::sleep(Duration::from_millis(1));
    }
}
