pub mod mock;
pub mod omdb;

use async_trait::async_trait;
use crate::core::MoviePayload;
use crate::error::Result;

pub use mock::{MockResponse, MockUpstream};
pub use omdb::OmdbClient;

/// Third-party movie data source (OMDb, ...)
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetch one movie by upstream ID.
    ///
    /// Fails with `NotFound` (carrying the upstream message) when the upstream
    /// reports no such movie, `UpstreamUnavailable` on transport failures.
    async fn fetch_by_id(&self, id: &str) -> Result<MoviePayload>;

    /// Candidate IDs matching a title query, in upstream order.
    ///
    /// Fails with `NoMatch` when the upstream has nothing for the query.
    async fn search_by_title(&self, query: &str) -> Result<Vec<String>>;

    /// Get provider name
    fn name(&self) -> &str;
}
