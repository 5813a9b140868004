//! Error types for profile loading and custom scanners.
//!
//! Every failure here is contained at the component where it occurs: the
//! registry falls back to the builtin default profile, the extraction
//! engine skips the failing rule. Nothing propagates to pipeline callers.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while locating, fetching, or parsing a syntax profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch profile from {url}: {reason}")]
    Http { url: String, reason: String },

    #[error("invalid profile YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("profile document root must be a mapping of token types to rules")]
    NotAMapping,

    #[error("no loader available for {0}")]
    UnsupportedLocation(String),
}

/// Failure reported by a custom scanner rule.
///
/// The extraction engine logs it, drops the rule's output for this pass,
/// and keeps running the remaining rules.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScanError {
    pub message: String,
}

impl ScanError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
