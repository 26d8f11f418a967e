use async_trait::async_trait;
use popcorn_models::{DetailRecord, SearchResult};

use crate::error::SourceError;

/// A remote movie catalog.
///
/// Implementations only translate requests and responses; cancellation and
/// ordering are the caller's concern.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Search by title. An empty match must be reported as `SourceError::NotFound`.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError>;

    /// Fetch the full record for one identifier
    async fn details(&self, imdb_id: &str) -> Result<DetailRecord, SourceError>;
}
