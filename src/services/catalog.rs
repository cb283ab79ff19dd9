use std::sync::Arc;
use tracing::debug;

use crate::cache::RecordCache;
use crate::core::{CatalogPage, CatalogQuery};
use crate::error::{MovieEngineError, Result};
use crate::services::SearchService;

/// Paginated, filtered, sorted view over the local cache, with a single
/// upstream fallback when a title search finds nothing locally.
pub struct CatalogQueryService {
    cache: Arc<dyn RecordCache>,
    search: Arc<SearchService>,
}

impl CatalogQueryService {
    pub fn new(cache: Arc<dyn RecordCache>, search: Arc<SearchService>) -> Self {
        Self { cache, search }
    }

    pub async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage> {
        query.validate()?;

        let page = self.run(query).await?;
        let Some(term) = query.effective_search_term() else {
            return Ok(page);
        };
        if !page.is_empty() {
            return Ok(page);
        }

        // Populate from upstream once, then re-run the identical query
        debug!(term = %term, "no local matches, populating from upstream");
        match self.search.search_by_title(term).await {
            Ok(found) => debug!(term = %term, fetched = found.len(), "upstream search populated cache"),
            Err(MovieEngineError::NoMatch(_)) => {
                debug!(term = %term, "upstream has no matches either")
            }
            Err(err) => return Err(err),
        }

        self.run(query).await
    }

    async fn run(&self, query: &CatalogQuery) -> Result<CatalogPage> {
        let (items, total) = self
            .cache
            .query(&query.filter(), query.sort, query.offset, query.limit)
            .await?;

        Ok(CatalogPage { items, total })
    }
}
