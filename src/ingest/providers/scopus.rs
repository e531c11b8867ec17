// src/ingest/providers/scopus.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{get_json, num, paper_record, text, trim_base};
use crate::error::FetchError;
use crate::ingest::types::SourceAdapter;
use crate::record::{IdentityPolicy, PaperFields, Record};

pub const NAME: &str = "scopus";
pub const MAX_LIMIT: usize = 25;

/// Scopus search, sorted by citation count.
/// Envelope: `{ "search-results": { "entry": [entry, ...] } }`.
/// An empty result set comes back as a single entry carrying `error`.
pub struct ScopusAdapter {
    base_url: String,
    client: Client,
    api_key: String,
    policy: IdentityPolicy,
    abstract_chars: usize,
}

impl ScopusAdapter {
    pub fn new(
        base_url: impl Into<String>,
        client: Client,
        api_key: impl Into<String>,
        policy: IdentityPolicy,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            api_key: api_key.into(),
            policy,
            abstract_chars: 500,
        }
    }

    pub fn with_abstract_chars(mut self, chars: usize) -> Self {
        self.abstract_chars = chars;
        self
    }
}

#[async_trait]
impl SourceAdapter for ScopusAdapter {
    type Raw = Value;
    type Fields = PaperFields;

    fn name(&self) -> &'static str {
        NAME
    }

    fn max_limit(&self) -> usize {
        MAX_LIMIT
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/content/search/scopus", trim_base(&self.base_url));
        let q = format!("TITLE-ABS-KEY({query})");
        let limit = limit.to_string();
        let req = self
            .client
            .get(url)
            .header("X-ELS-APIKey", &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("query", q.as_str()),
                ("count", limit.as_str()),
                ("sort", "citedby-count"),
            ]);

        let body = get_json(req).await?;
        let entries = body
            .get("search-results")
            .and_then(|r| r.get("entry"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|e| e.get("error").is_none())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(entries)
    }

    fn normalize(&self, raw: Value, concept: &str, query: &str) -> Record<PaperFields> {
        let year = text(raw.get("prism:coverDate"))
            .and_then(|d| d.get(..4).and_then(|y| y.parse::<i32>().ok()));

        let fields = PaperFields {
            provider_id: text(raw.get("dc:identifier")),
            authors: text(raw.get("dc:creator")).into_iter().collect(),
            year,
            venue: text(raw.get("prism:publicationName")),
            citations: num(raw.get("citedby-count"))
                .map(|c| c.max(0.0) as u64)
                .unwrap_or(0),
            abstract_text: text(raw.get("dc:description")).unwrap_or_default(),
            doi: text(raw.get("prism:doi")),
            url: text(raw.get("prism:url")),
        };
        paper_record(
            NAME,
            text(raw.get("dc:title")),
            fields,
            self.abstract_chars,
            &self.policy,
            concept,
            query,
        )
    }
}
