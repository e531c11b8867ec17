// src/record.rs
//! Common record shape produced by every source adapter.
//!
//! A `Record<F>` carries the identity key used for dedup, a human label, the
//! category-specific typed fields `F`, and where it came from. Records live for
//! one pipeline run only.

use serde::{Deserialize, Serialize};

/// Dedup key of a record.
///
/// `External` wins whenever the provider supplies a stable id (market id, DOI).
/// `Fallback` is the normalized-title key; an empty fallback never collides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Identity {
    External(String),
    Fallback(String),
}

impl Identity {
    /// Build an identity from an optional external id, falling back to `title_key(label)`.
    pub fn resolve(external: Option<&str>, label: &str, policy: &IdentityPolicy) -> Self {
        match external.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Identity::External(id.to_string()),
            None => Identity::Fallback(title_key(label, policy)),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Identity::External(k) | Identity::Fallback(k) => k,
        }
    }

    /// Fallback keys derived from an empty title carry no identity at all.
    pub fn is_blank(&self) -> bool {
        matches!(self, Identity::Fallback(k) if k.is_empty())
    }
}

/// How strictly fallback title keys are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityPolicy {
    /// Prefix length of the normalized title key.
    pub title_key_chars: usize,
    /// Use the full normalized title (no truncation, no prefix collisions).
    pub strict_titles: bool,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            title_key_chars: 50,
            strict_titles: false,
        }
    }
}

/// Lowercase, keep `[a-z0-9]` only, truncate to the policy prefix.
///
/// Two distinct titles sharing the first `title_key_chars` alphanumerics
/// collapse into one key unless `strict_titles` is set.
pub fn title_key(title: &str, policy: &IdentityPolicy) -> String {
    let it = title
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if policy.strict_titles {
        it.collect()
    } else {
        it.take(policy.title_key_chars).collect()
    }
}

/// Which adapter produced a record and under which logical query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: String,
    pub concept: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<F> {
    pub identity: Identity,
    pub label: String,
    pub fields: F,
    pub provenance: Provenance,
}

/// Prediction-market fields. Absent metrics default to zero / `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketFields {
    pub slug: Option<String>,
    pub description: Option<String>,
    pub outcomes: Vec<String>,
    pub outcome_prices: Vec<f64>,
    pub volume: f64,
    pub volume_24hr: f64,
    pub liquidity: f64,
    pub spread: Option<f64>,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub last_trade_price: Option<f64>,
    pub one_day_price_change: Option<f64>,
    pub mid_price: Option<f64>,
    pub volume_to_liquidity: f64,
    pub created_at: Option<String>,
    pub end_date: Option<String>,
    /// Topic names assigned by keyword classification, in config order.
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Scholarly paper fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperFields {
    pub provider_id: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub citations: u64,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub doi: Option<String>,
    pub url: Option<String>,
}
