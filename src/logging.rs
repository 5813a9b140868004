//! Tracing setup for the inspect binary.
//!
//! Configure via the RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=tint::scanner=trace` - module-level filtering

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a compact stderr subscriber. Respects RUST_LOG, defaulting
/// to `warn` so contained failures (bad rules, failed loads) stay visible.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .compact()
        .init();
}
