// src/ingest/types.rs
use async_trait::async_trait;

use crate::error::FetchError;
use crate::record::Record;

/// A provider adapter: one HTTP query in, provider-shaped items out, plus a
/// total mapping from those items into the common record shape.
#[async_trait]
pub trait SourceAdapter: Send + Sync + 'static {
    type Raw: Send;
    type Fields: Send + 'static;

    fn name(&self) -> &'static str;

    /// Provider cap on results per query.
    fn max_limit(&self) -> usize;

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<Self::Raw>, FetchError>;

    /// Must never fail: absent fields map to defaults.
    fn normalize(&self, raw: Self::Raw, concept: &str, query: &str) -> Record<Self::Fields>;
}

/// Object-safe view over any adapter producing `Record<F>`.
#[async_trait]
pub trait RecordSource<F>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn collect(
        &self,
        query: &str,
        limit: usize,
        concept: &str,
    ) -> Result<Vec<Record<F>>, FetchError>;
}

#[async_trait]
impl<A> RecordSource<A::Fields> for A
where
    A: SourceAdapter,
{
    fn name(&self) -> &'static str {
        SourceAdapter::name(self)
    }

    async fn collect(
        &self,
        query: &str,
        limit: usize,
        concept: &str,
    ) -> Result<Vec<Record<A::Fields>>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchError::InvalidQuery);
        }
        let limit = limit.clamp(1, self.max_limit().max(1));
        let raw = self.fetch(query, limit).await?;
        Ok(raw
            .into_iter()
            .map(|r| self.normalize(r, concept, query))
            .collect())
    }
}
