//! Paper signals: IMPACT (citations, log scaled), RECENCY (publication year),
//! COMPLETENESS (metadata richness).

use super::scoring::{clamp01, Scorer, Signal};
use super::weights::PaperScoring;
use crate::record::PaperFields;

pub const IMPACT: &str = "IMPACT";
pub const RECENCY: &str = "RECENCY";
pub const COMPLETENESS: &str = "COMPLETENESS";

pub const SIGNALS: &[&str] = &[IMPACT, RECENCY, COMPLETENESS];

/// log10(citations+1) / log10(saturation+1).
pub fn impact(f: &PaperFields, saturation: u64) -> f64 {
    let denom = ((saturation.max(1) as f64) + 1.0).log10();
    clamp01(((f.citations as f64) + 1.0).log10() / denom)
}

/// Linear from 0 at `pivot - window` to 1 at `pivot`. Unknown year → 0.
pub fn recency(f: &PaperFields, pivot_year: i32, window_years: f64) -> f64 {
    let Some(year) = f.year else {
        return 0.0;
    };
    if !(window_years.is_finite() && window_years > 0.0) {
        return 0.0;
    }
    let start = pivot_year as f64 - window_years;
    clamp01((year as f64 - start) / window_years)
}

/// Share of {abstract, doi, venue, authors} present.
pub fn completeness(f: &PaperFields) -> f64 {
    let present = [
        !f.abstract_text.trim().is_empty(),
        f.doi.as_deref().is_some_and(|d| !d.trim().is_empty()),
        f.venue.as_deref().is_some_and(|v| !v.trim().is_empty()),
        !f.authors.is_empty(),
    ];
    present.iter().filter(|p| **p).count() as f64 / present.len() as f64
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PaperScorer {
    scoring: PaperScoring,
}

impl PaperScorer {
    pub fn new(scoring: PaperScoring) -> Self {
        Self { scoring }
    }
}

impl Scorer for PaperScorer {
    type Fields = PaperFields;

    fn category(&self) -> &'static str {
        "papers"
    }

    fn signal_names(&self) -> &'static [&'static str] {
        SIGNALS
    }

    fn signals(&self, f: &PaperFields) -> Vec<Signal> {
        let s = &self.scoring;
        vec![
            Signal::new(IMPACT, impact(f, s.citation_saturation)),
            Signal::new(RECENCY, recency(f, s.recency_pivot_year, s.recency_window_years)),
            Signal::new(COMPLETENESS, completeness(f)),
        ]
    }

    fn weight(&self, signal: &str) -> f64 {
        let w = &self.scoring.weights;
        match signal {
            IMPACT => w.impact,
            RECENCY => w.recency,
            COMPLETENESS => w.completeness,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_saturates_on_log_scale() {
        let f = |c| PaperFields {
            citations: c,
            ..PaperFields::default()
        };
        assert_eq!(impact(&f(0), 1000), 0.0);
        assert!((impact(&f(1000), 1000) - 1.0).abs() < 1e-12);
        assert_eq!(impact(&f(50_000), 1000), 1.0);
        assert!(impact(&f(50), 1000) > 0.5 && impact(&f(50), 1000) < 0.6);
    }

    #[test]
    fn recency_is_linear_and_clamped() {
        let f = |y| PaperFields {
            year: y,
            ..PaperFields::default()
        };
        assert_eq!(recency(&f(None), 2026, 10.0), 0.0);
        assert_eq!(recency(&f(Some(2026)), 2026, 10.0), 1.0);
        assert!((recency(&f(Some(2021)), 2026, 10.0) - 0.5).abs() < 1e-12);
        assert_eq!(recency(&f(Some(1990)), 2026, 10.0), 0.0);
        assert_eq!(recency(&f(Some(2030)), 2026, 10.0), 1.0);
        assert_eq!(recency(&f(Some(2020)), 2026, 0.0), 0.0);
    }

    #[test]
    fn completeness_counts_fields() {
        let mut f = PaperFields::default();
        assert_eq!(completeness(&f), 0.0);
        f.doi = Some("10.1/x".into());
        f.authors = vec!["A".into()];
        assert_eq!(completeness(&f), 0.5);
    }
}
