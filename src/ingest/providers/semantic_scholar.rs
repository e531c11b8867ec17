// src/ingest/providers/semantic_scholar.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{get_json, num, paper_record, text, trim_base};
use crate::error::FetchError;
use crate::ingest::types::SourceAdapter;
use crate::record::{IdentityPolicy, PaperFields, Record};

pub const NAME: &str = "semantic_scholar";
pub const MAX_LIMIT: usize = 100;
const FIELDS: &str = "paperId,title,abstract,year,citationCount,authors,venue,externalIds,url";

/// Graph API paper search. Envelope: `{ "total": N, "data": [paper, ...] }`.
pub struct SemanticScholarAdapter {
    base_url: String,
    client: Client,
    api_key: String,
    policy: IdentityPolicy,
    abstract_chars: usize,
}

impl SemanticScholarAdapter {
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
impl SourceAdapter for SemanticScholarAdapter {
    type Raw = Value;
    type Fields = PaperFields;

    fn name(&self) -> &'static str {
        NAME
    }

    fn max_limit(&self) -> usize {
        MAX_LIMIT
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/graph/v1/paper/search", trim_base(&self.base_url));
        let limit = limit.to_string();
        let req = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .query(&[("query", query), ("limit", limit.as_str()), ("fields", FIELDS)]);

        let body = get_json(req).await?;
        Ok(match body.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        })
    }

    fn normalize(&self, raw: Value, concept: &str, query: &str) -> Record<PaperFields> {
        let paper_id = text(raw.get("paperId"));
        let authors = match raw.get("authors") {
            Some(Value::Array(list)) => list
                .iter()
                .filter_map(|a| text(a.get("name")))
                .collect(),
            _ => Vec::new(),
        };
        let url = text(raw.get("url")).or_else(|| {
            paper_id
                .as_ref()
                .map(|id| format!("https://www.semanticscholar.org/paper/{id}"))
        });

        let fields = PaperFields {
            provider_id: paper_id,
            authors,
            year: num(raw.get("year")).map(|y| y as i32),
            venue: text(raw.get("venue")),
            citations: num(raw.get("citationCount"))
                .map(|c| c.max(0.0) as u64)
                .unwrap_or(0),
            abstract_text: text(raw.get("abstract")).unwrap_or_default(),
            doi: raw.get("externalIds").and_then(|ids| text(ids.get("DOI"))),
            url,
        };
        paper_record(
            NAME,
            text(raw.get("title")),
            fields,
            self.abstract_chars,
            &self.policy,
            concept,
            query,
        )
    }
}
