//! Composite weights and bucket thresholds per category.
//!
//! TOML shape (all keys optional, defaults below):
//! ```toml
//! [scoring.market.weights]
//! rds = 0.35
//! vpdi = 0.25
//! mss = 0.20
//! ui = 0.10
//! att = 0.10
//! ```
//!
//! Weights are load-time constants: they are read once with the pipeline
//! config and never change during a run.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketWeights {
    pub rds: f64,
    pub vpdi: f64,
    pub mss: f64,
    pub ui: f64,
    pub att: f64,
}

impl Default for MarketWeights {
    fn default() -> Self {
        Self {
            rds: 0.35,
            vpdi: 0.25,
            mss: 0.20,
            ui: 0.10,
            att: 0.10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketThresholds {
    /// `rapid_shifts`: RDS strictly above this.
    pub rapid_shift_rds: f64,
    /// `contested`: VPDI strictly above this (and significant).
    pub contested_vpdi: f64,
    /// `high_uncertainty`: UI strictly above this (and significant).
    pub uncertain_ui: f64,
    /// Minimum MSS for a market to count as significant.
    pub significant_mss: f64,
}

impl Default for MarketThresholds {
    fn default() -> Self {
        Self {
            rapid_shift_rds: 0.3,
            contested_vpdi: 0.5,
            uncertain_ui: 0.7,
            significant_mss: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketScoring {
    pub weights: MarketWeights,
    pub thresholds: MarketThresholds,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperWeights {
    pub impact: f64,
    pub recency: f64,
    pub completeness: f64,
}

impl Default for PaperWeights {
    fn default() -> Self {
        Self {
            impact: 0.6,
            recency: 0.3,
            completeness: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperThresholds {
    pub high_citation: u64,
    pub recent_year: i32,
}

impl Default for PaperThresholds {
    fn default() -> Self {
        Self {
            high_citation: 50,
            recent_year: 2022,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperScoring {
    pub weights: PaperWeights,
    pub thresholds: PaperThresholds,
    /// Citation count that maps to IMPACT = 1.0 (log scale).
    pub citation_saturation: u64,
    /// Year that maps to RECENCY = 1.0.
    pub recency_pivot_year: i32,
    /// Years before the pivot at which RECENCY reaches 0.
    pub recency_window_years: f64,
}

impl Default for PaperScoring {
    fn default() -> Self {
        use chrono::Datelike;
        Self {
            weights: PaperWeights::default(),
            thresholds: PaperThresholds::default(),
            citation_saturation: 1000,
            recency_pivot_year: chrono::Utc::now().year(),
            recency_window_years: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub market: MarketScoring,
    pub paper: PaperScoring,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.market.weights;
        let p = &self.paper.weights;
        for (name, w) in [
            ("scoring.market.weights.rds", m.rds),
            ("scoring.market.weights.vpdi", m.vpdi),
            ("scoring.market.weights.mss", m.mss),
            ("scoring.market.weights.ui", m.ui),
            ("scoring.market.weights.att", m.att),
            ("scoring.paper.weights.impact", p.impact),
            ("scoring.paper.weights.recency", p.recency),
            ("scoring.paper.weights.completeness", p.completeness),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::invalid(name, "weight must be finite and >= 0"));
            }
        }
        if !(self.paper.recency_window_years.is_finite() && self.paper.recency_window_years > 0.0)
        {
            return Err(ConfigError::invalid(
                "scoring.paper.recency_window_years",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: ScoringConfig = toml::from_str(
            r#"
[market.weights]
rds = 0.5
"#,
        )
        .unwrap();
        assert!((cfg.market.weights.rds - 0.5).abs() < f64::EPSILON);
        assert!((cfg.market.weights.vpdi - 0.25).abs() < f64::EPSILON);
        assert_eq!(cfg.paper.thresholds.high_citation, 50);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.paper.weights.recency = -1.0;
        assert!(cfg.validate().is_err());
    }
}
