// src/error.rs
//! Error taxonomy for the pipeline.
//!
//! - `ConfigError`: fatal, raised before any network activity.
//! - `FetchError`: per-query, absorbed by the fetch scheduler (logged, zero records).
//! - `PipelineError`: fatal run failures surfaced to the caller.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{path} points to a non-existent file")]
    MissingFile { path: PathBuf },

    #[error("missing credential for provider `{provider}` (expected in {location})")]
    MissingCredential {
        provider: &'static str,
        location: String,
    },

    #[error("invalid configuration value `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("query must not be empty")]
    InvalidQuery,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("fetch task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
