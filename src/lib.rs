//! tint - reactive syntax-highlight tokenizer
//!
//! Tokenizes source-code snippets into named, possibly overlapping
//! character ranges for rendering-time coloring. Profiles map token type
//! names to rules (regex pattern, keyword list, or procedural scanner);
//! declaration order doubles as layering priority, with later types
//! painting over earlier ones wherever ranges overlap.
//!
//! One-shot use:
//!
//! ```
//! use tint::profile::{KeywordSet, Rule, SyntaxProfile};
//! use tint::scanner::ArgumentScanner;
//!
//! let profile = SyntaxProfile::new()
//!     .with("keyword", Rule::Keywords(KeywordSet::compile(["function", "return"]).unwrap()))
//!     .with("argument", ArgumentScanner::php().into_rule());
//!
//! let result = tint::tokenize("function add($a, $b) { return $a + $b; }", &profile);
//! assert_eq!(result.get("argument").unwrap().len(), 2);
//! ```
//!
//! For live content, [`Highlighter`] debounces change notifications,
//! resolves named profiles through a shared [`ProfileRegistry`], and
//! pushes each pass into a [`HighlightSink`], discarding stale
//! asynchronous results along the way.

pub mod commands;
pub mod error;
pub mod extract;
pub mod layering;
pub mod logging;
pub mod messages;
pub mod pipeline;
pub mod profile;
pub mod range;
pub mod registry;
pub mod scanner;
pub mod text;

// Re-export commonly used types
pub use commands::Cmd;
pub use layering::{HighlightSink, ResolvedSpan};
pub use messages::Msg;
pub use pipeline::Highlighter;
pub use profile::{Rule, SyntaxProfile};
pub use range::{Generation, HighlightRange, HighlightResult};
pub use registry::{ProfileRegistry, ProfileSource};
pub use scanner::ArgumentScanner;
pub use text::SourceText;

/// Tokenize `text` under `profile` in one synchronous pass: normalize,
/// then run every rule in declaration order. No debounce, no registry.
pub fn tokenize(text: &str, profile: &SyntaxProfile) -> HighlightResult {
    extract::extract_all(profile, &SourceText::new(text))
}
