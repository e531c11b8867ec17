// src/ingest/providers/polymarket.rs
//! Prediction-market listing adapter (gamma `/markets` endpoint).
//!
//! The listing endpoint takes no free text: `query` only names the listing in
//! provenance. Numeric fields arrive as numbers or numeric strings, and
//! `outcomes` / `outcomePrices` as JSON-encoded string arrays.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{get_json, list, num, text, trim_base};
use crate::error::FetchError;
use crate::ingest::types::SourceAdapter;
use crate::ingest::{normalize_text, truncate_chars};
use crate::record::{Identity, IdentityPolicy, MarketFields, Provenance, Record};

pub const NAME: &str = "polymarket";
pub const MAX_LIMIT: usize = 500;

pub struct PolymarketAdapter {
    base_url: String,
    client: Client,
    policy: IdentityPolicy,
    description_chars: usize,
}

impl PolymarketAdapter {
    pub fn new(base_url: impl Into<String>, client: Client, policy: IdentityPolicy) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            policy,
            description_chars: 300,
        }
    }

    pub fn with_description_chars(mut self, chars: usize) -> Self {
        self.description_chars = chars;
        self
    }
}

#[async_trait]
impl SourceAdapter for PolymarketAdapter {
    type Raw = Value;
    type Fields = MarketFields;

    fn name(&self) -> &'static str {
        NAME
    }

    fn max_limit(&self) -> usize {
        MAX_LIMIT
    }

    async fn fetch(&self, _query: &str, limit: usize) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/markets", trim_base(&self.base_url));
        let limit = limit.to_string();
        let req = self.client.get(url).query(&[
            ("active", "true"),
            ("closed", "false"),
            ("limit", limit.as_str()),
        ]);
        match get_json(req).await? {
            Value::Array(items) => Ok(items),
            other => Err(FetchError::Decode(format!(
                "expected a market array, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn normalize(&self, raw: Value, concept: &str, query: &str) -> Record<MarketFields> {
        let question = text(raw.get("question"))
            .map(|q| normalize_text(&q))
            .unwrap_or_default();
        let id = text(raw.get("id"));
        let slug = text(raw.get("slug"));

        let outcome_prices: Vec<f64> = list(raw.get("outcomePrices"))
            .iter()
            .filter_map(|v| num(Some(v)))
            .collect();
        let outcomes: Vec<String> = list(raw.get("outcomes"))
            .iter()
            .filter_map(|v| text(Some(v)))
            .collect();

        let volume = num(raw.get("volume"))
            .or_else(|| num(raw.get("volumeNum")))
            .unwrap_or(0.0);
        let volume_24hr = num(raw.get("volume24hr")).unwrap_or(0.0);
        let liquidity = num(raw.get("liquidity"))
            .or_else(|| num(raw.get("liquidityNum")))
            .unwrap_or(0.0);
        let last_trade_price = num(raw.get("lastTradePrice"));

        let fields = MarketFields {
            slug: slug.clone(),
            description: text(raw.get("description"))
                .map(|d| truncate_chars(&normalize_text(&d), self.description_chars)),
            mid_price: outcome_prices.first().copied().or(last_trade_price),
            outcomes,
            outcome_prices,
            volume,
            volume_24hr,
            liquidity,
            spread: num(raw.get("spread")),
            best_bid: num(raw.get("bestBid")),
            best_ask: num(raw.get("bestAsk")),
            last_trade_price,
            one_day_price_change: num(raw.get("oneDayPriceChange")),
            volume_to_liquidity: ratio(volume_24hr, liquidity),
            created_at: text(raw.get("createdAt")),
            end_date: text(raw.get("endDate")),
            topics: Vec::new(),
        };

        Record {
            identity: Identity::resolve(id.or(slug).as_deref(), &question, &self.policy),
            label: if question.is_empty() {
                "Unknown".into()
            } else {
                question
            },
            fields,
            provenance: Provenance {
                source: NAME.to_string(),
                concept: concept.to_string(),
                query: query.to_string(),
            },
        }
    }
}

/// Zero unless the quotient is finite; tiny liquidity can overflow to inf.
fn ratio(volume: f64, liquidity: f64) -> f64 {
    if liquidity > 0.0 {
        let r = volume / liquidity;
        if r.is_finite() {
            return r;
        }
    }
    0.0
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
