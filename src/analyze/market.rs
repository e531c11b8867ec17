//! Market signals.
//!
//! | Signal | Reads | Meaning |
//! |---|---|---|
//! | VPDI | volume_24hr, liquidity, one_day_price_change | heavy trading without price movement (contested) |
//! | RDS  | one_day_price_change, volume_24hr, liquidity | large 24h move backed by volume |
//! | MSS  | volume, liquidity, volume_24hr | overall significance (log scaled) |
//! | UI   | mid_price, volume_24hr | price near 50% (uncertainty) |
//! | ATT  | volume_24hr, volume | share of lifetime volume traded in 24h |
//!
//! Zero or missing liquidity/volume denominators are replaced by 1.

use super::scoring::{clamp01, Scorer, Signal};
use super::weights::MarketWeights;
use crate::record::MarketFields;

pub const VPDI: &str = "VPDI";
pub const RDS: &str = "RDS";
pub const MSS: &str = "MSS";
pub const UI: &str = "UI";
pub const ATT: &str = "ATT";

pub const SIGNALS: &[&str] = &[RDS, VPDI, MSS, UI, ATT];

/// Below this absolute 24h change the price counts as flat.
const FLAT_CHANGE: f64 = 0.001;
/// RDS ignores moves smaller than this.
const SHIFT_FLOOR: f64 = 0.03;
/// UI boost applies above this 24h volume.
const UI_BOOST_VOLUME: f64 = 10_000.0;
const UI_BOOST: f64 = 1.2;
/// 24h volume that saturates MSS activity.
const ACTIVITY_SATURATION: f64 = 50_000.0;

fn nonneg(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

fn or_one(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        1.0
    }
}

fn abs_change(f: &MarketFields) -> f64 {
    f.one_day_price_change
        .filter(|c| c.is_finite())
        .map(f64::abs)
        .unwrap_or(0.0)
}

/// Volume-price decoupling index.
pub fn vpdi(f: &MarketFields) -> f64 {
    let normalized_vol = nonneg(f.volume_24hr) / or_one(f.liquidity);
    let change = abs_change(f);
    if change < FLAT_CHANGE {
        return if normalized_vol > 0.5 { 1.0 } else { 0.0 };
    }
    clamp01(normalized_vol / (change * 10.0 + 0.1))
}

/// Rapid directional shift.
pub fn rds(f: &MarketFields) -> f64 {
    let magnitude = abs_change(f);
    if magnitude < SHIFT_FLOOR {
        return 0.0;
    }
    let volume_support = (nonneg(f.volume_24hr) / (or_one(f.liquidity) * 2.0)).min(1.0);
    clamp01(magnitude * volume_support * 5.0)
}

/// Market significance score.
pub fn mss(f: &MarketFields) -> f64 {
    let vol_score = ((nonneg(f.volume) + 1.0).log10() / 7.0).min(1.0); // 10M = 1.0
    let liq_score = ((nonneg(f.liquidity) + 1.0).log10() / 5.0).min(1.0); // 100K = 1.0
    let activity = (nonneg(f.volume_24hr) / ACTIVITY_SATURATION).min(1.0);
    clamp01(vol_score * 0.4 + liq_score * 0.3 + activity * 0.3)
}

/// Uncertainty index.
pub fn ui(f: &MarketFields) -> f64 {
    let price = match f.mid_price {
        Some(p) if p.is_finite() && p != 0.0 => p,
        _ => return 0.0,
    };
    let from_price = 1.0 - (price - 0.5).abs() * 2.0;
    let boost = if f.volume_24hr > UI_BOOST_VOLUME {
        UI_BOOST
    } else {
        1.0
    };
    clamp01(from_price * boost)
}

/// Attention: recent share of lifetime volume.
pub fn att(f: &MarketFields) -> f64 {
    clamp01(nonneg(f.volume_24hr) / or_one(f.volume) * 10.0)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MarketScorer {
    weights: MarketWeights,
}

impl MarketScorer {
    pub fn new(weights: MarketWeights) -> Self {
        Self { weights }
    }
}

impl Scorer for MarketScorer {
    type Fields = MarketFields;

    fn category(&self) -> &'static str {
        "markets"
    }

    fn signal_names(&self) -> &'static [&'static str] {
        SIGNALS
    }

    fn signals(&self, f: &MarketFields) -> Vec<Signal> {
        vec![
            Signal::new(RDS, rds(f)),
            Signal::new(VPDI, vpdi(f)),
            Signal::new(MSS, mss(f)),
            Signal::new(UI, ui(f)),
            Signal::new(ATT, att(f)),
        ]
    }

    fn weight(&self, signal: &str) -> f64 {
        match signal {
            RDS => self.weights.rds,
            VPDI => self.weights.vpdi,
            MSS => self.weights.mss,
            UI => self.weights.ui,
            ATT => self.weights.att,
            _ => 0.0,
        }
    }
}
