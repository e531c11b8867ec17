// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod credentials;
pub mod error;
pub mod record;

// Fetch: adapters + bounded scheduler
pub mod ingest;

// Markets-only topic tagging
pub mod classify;
pub mod dedup;

// Signals and composite
pub mod analyze;

pub mod pipeline;
pub mod report;

// ---- Re-exports for stable public API ----
pub use crate::error::{ConfigError, FetchError, PipelineError};
pub use crate::pipeline::{Pipeline, RunOutput, StageEvent, Telemetry};
pub use crate::record::{Identity, MarketFields, PaperFields, Provenance, Record};
pub use crate::report::{Report, RunReport};
