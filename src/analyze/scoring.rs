//! Generic scoring: named signals in [0,1] and their weighted composite.
//!
//! Each `Scorer` computes its signals from a record's typed fields only.
//! No signal reads another signal, and no signal sees other records.
//!
//! composite = Σ weight(name) · value(name)
//! (no normalization; weights are designed to sum to 1).

use serde::{Deserialize, Serialize};

use crate::record::Record;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub value: f64,
}

impl Signal {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value: clamp01(value),
        }
    }
}

/// A record plus its signals (definition order) and composite score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord<F> {
    pub record: Record<F>,
    pub signals: Vec<Signal>,
    pub composite: f64,
}

impl<F> ScoredRecord<F> {
    /// Signal value by name; unknown names read as 0.
    pub fn signal(&self, name: &str) -> f64 {
        self.signals
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value)
            .unwrap_or(0.0)
    }
}

pub trait Scorer {
    type Fields;

    /// Category name used in reports ("markets", "papers").
    fn category(&self) -> &'static str;

    /// Signal names in the order `signals` emits them.
    fn signal_names(&self) -> &'static [&'static str];

    fn signals(&self, fields: &Self::Fields) -> Vec<Signal>;

    fn weight(&self, signal: &str) -> f64;

    fn composite(&self, signals: &[Signal]) -> f64 {
        signals.iter().map(|s| self.weight(&s.name) * s.value).sum()
    }
}

/// Score every record, preserving input order.
pub fn score_all<S: Scorer>(
    scorer: &S,
    records: Vec<Record<S::Fields>>,
) -> Vec<ScoredRecord<S::Fields>> {
    records
        .into_iter()
        .map(|record| {
            let signals = scorer.signals(&record.fields);
            let composite = scorer.composite(&signals);
            ScoredRecord {
                record,
                signals,
                composite,
            }
        })
        .collect()
}

/// Clamp to [0.0, 1.0]; NaN maps to 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
