// src/analyze/mod.rs
//! Signal scoring: per-category signals plus the weighted composite.

pub mod market;
pub mod paper;
pub mod scoring;
pub mod weights;

pub use crate::analyze::market::MarketScorer;
pub use crate::analyze::paper::PaperScorer;
pub use crate::analyze::scoring::{clamp01, score_all, ScoredRecord, Scorer, Signal};
pub use crate::analyze::weights::{
    MarketScoring, MarketThresholds, MarketWeights, PaperScoring, PaperThresholds, PaperWeights,
    ScoringConfig,
};
