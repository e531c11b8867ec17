// src/ingest/providers/mod.rs
//! HTTP source adapters plus the lenient field readers they share.
//!
//! Provider payloads are decoded as `serde_json::Value` and read field by field,
//! so a missing or oddly typed field degrades to a default instead of failing
//! the whole response.

pub mod polymarket;
pub mod scopus;
pub mod semantic_scholar;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{ConfigError, FetchError};
use crate::ingest::{normalize_text, truncate_chars};
use crate::record::{Identity, IdentityPolicy, PaperFields, Provenance, Record};

pub use polymarket::PolymarketAdapter;
pub use scopus::ScopusAdapter;
pub use semantic_scholar::SemanticScholarAdapter;

/// Shared client: user agent + connect/request timeouts from config.
pub fn http_client(cfg: &FetchConfig) -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(cfg.user_agent.clone())
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs.max(1)))
        .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
        .build()
        .map_err(|e| ConfigError::invalid("fetch", format!("cannot build http client: {e}")))
}

/// Send, require a 2xx status, decode the body as JSON.
pub(crate) async fn get_json(req: RequestBuilder) -> Result<Value, FetchError> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
}

pub(crate) fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Number or numeric string; non-finite values count as absent.
pub(crate) fn num(v: Option<&Value>) -> Option<f64> {
    let x = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

/// Non-empty string (numbers are stringified, e.g. numeric ids).
pub(crate) fn text(v: Option<&Value>) -> Option<String> {
    let s = match v? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Array of values, or a string holding a JSON-encoded array.
pub(crate) fn list(v: Option<&Value>) -> Vec<Value> {
    match v {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Build a paper record with DOI-first identity.
pub(crate) fn paper_record(
    source: &str,
    title: Option<String>,
    mut fields: PaperFields,
    abstract_chars: usize,
    policy: &IdentityPolicy,
    concept: &str,
    query: &str,
) -> Record<PaperFields> {
    let title = title.map(|t| normalize_text(&t)).unwrap_or_default();
    fields.abstract_text = truncate_chars(&normalize_text(&fields.abstract_text), abstract_chars);
    fields.venue = fields.venue.filter(|v| !v.trim().is_empty());
    let doi_key = fields.doi.as_deref().map(|d| d.trim().to_ascii_lowercase());
    Record {
        identity: Identity::resolve(doi_key.as_deref(), &title, policy),
        label: if title.is_empty() { "Unknown".into() } else { title },
        fields,
        provenance: Provenance {
            source: source.to_string(),
            concept: concept.to_string(),
            query: query.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn num_accepts_numbers_and_numeric_strings() {
        let v = json!({"a": 1.5, "b": "2500.25", "c": "n/a", "d": null});
        assert_eq!(num(v.get("a")), Some(1.5));
        assert_eq!(num(v.get("b")), Some(2500.25));
        assert_eq!(num(v.get("c")), None);
        assert_eq!(num(v.get("d")), None);
        assert_eq!(num(v.get("missing")), None);
    }

    #[test]
    fn list_decodes_embedded_json_arrays() {
        let v = json!({"p": "[\"0.62\", \"0.38\"]", "o": ["Yes", "No"], "bad": "[oops"});
        let prices: Vec<f64> = list(v.get("p")).iter().filter_map(|x| num(Some(x))).collect();
        assert_eq!(prices, vec![0.62, 0.38]);
        assert_eq!(list(v.get("o")).len(), 2);
        assert!(list(v.get("bad")).is_empty());
    }

    #[test]
    fn paper_identity_prefers_lowercased_doi() {
        let p = IdentityPolicy::default();
        let fields = PaperFields {
            doi: Some("10.1000/ABC".into()),
            ..PaperFields::default()
        };
        let r = paper_record("x", Some("T".into()), fields, 500, &p, "c", "q");
        assert_eq!(r.identity, Identity::External("10.1000/abc".into()));
        assert_eq!(r.fields.doi.as_deref(), Some("10.1000/ABC"));

        let untitled = paper_record("x", None, PaperFields::default(), 500, &p, "c", "q");
        assert_eq!(untitled.label, "Unknown");
        assert!(untitled.identity.is_blank());
    }
}
