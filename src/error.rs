//! # Error Types
//!
//! @title Route-Sentinel Errors
//! @author Ramprasad
//!
//! Typed errors surfaced by the library. The binary wraps these in
//! `anyhow` at the top level; recoverable conditions (a single unparsable
//! route file, a failed fuzz request) are handled where they occur and never
//! reach this type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading configuration, parsing routes, or
/// preparing the fuzz client.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The security config file is not valid JSON or has an unknown shape.
    #[error("invalid security config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A report file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The TypeScript parser could not produce a syntax tree.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    /// The HTTP client used for fuzzing could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, SentinelError>;
