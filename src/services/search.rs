use futures::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::MovieRecord;
use crate::error::{MovieEngineError, Result};
use crate::providers::UpstreamClient;
use crate::services::LookupService;

/// Title search: upstream candidate IDs hydrated concurrently through
/// [`LookupService`]. One bad candidate never fails the whole search.
pub struct SearchService {
    upstream: Arc<dyn UpstreamClient>,
    lookup: Arc<LookupService>,
    max_concurrent: usize,
}

impl SearchService {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        lookup: Arc<LookupService>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            upstream,
            lookup,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub async fn search_by_title(&self, query: &str) -> Result<Vec<MovieRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MovieEngineError::Validation(
                "search query must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let candidates: Vec<String> = self
            .upstream
            .search_by_title(query)
            .await?
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        debug!(query = %query, candidates = candidates.len(), "hydrating search candidates");

        // Every lookup runs to completion; results land in their upstream slot
        let mut slots: Vec<Option<MovieRecord>> = vec![None; candidates.len()];
        let lookup = &self.lookup;
        let outcomes: Vec<(usize, Result<MovieRecord>)> = stream::iter(candidates.iter().enumerate())
            .map(|(index, id)| async move { (index, lookup.resolve(id).await) })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for (index, outcome) in outcomes {
            match outcome {
                Ok(record) => slots[index] = Some(record),
                Err(err) => {
                    warn!(query = %query, id = %candidates[index], error = %err, "dropping search candidate");
                }
            }
        }

        let results: Vec<MovieRecord> = slots.into_iter().flatten().collect();
        if results.is_empty() {
            return Err(MovieEngineError::NoMatch(query.to_string()));
        }

        debug!(query = %query, results = results.len(), "search complete");
        Ok(results)
    }
}
