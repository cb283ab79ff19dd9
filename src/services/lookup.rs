use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::RecordCache;
use crate::core::MovieRecord;
use crate::error::{MovieEngineError, Result};
use crate::providers::UpstreamClient;

/// Resolves a single movie by ID: cache hit within the TTL, otherwise
/// fetch from upstream and upsert.
pub struct LookupService {
    cache: Arc<dyn RecordCache>,
    upstream: Arc<dyn UpstreamClient>,
    ttl: chrono::Duration,
}

impl LookupService {
    pub fn new(
        cache: Arc<dyn RecordCache>,
        upstream: Arc<dyn UpstreamClient>,
        ttl: chrono::Duration,
    ) -> Self {
        Self { cache, upstream, ttl }
    }

    pub async fn resolve(&self, id: &str) -> Result<MovieRecord> {
        let id = id.trim();
        if id.is_empty() {
            return Err(MovieEngineError::Validation(
                "movie id must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        if let Some(cached) = self.cache.find_by_key(id).await? {
            if cached.is_fresh(now, self.ttl) {
                debug!(id = %id, "cache hit");
                return Ok(cached);
            }
            debug!(id = %id, cached_at = %cached.cached_at, "cache entry expired, refreshing");
        } else {
            debug!(id = %id, "cache miss");
        }

        let payload = self.upstream.fetch_by_id(id).await?;
        if payload.title.is_none() {
            warn!(id = %id, provider = self.upstream.name(), "upstream payload has no title, caching as-is");
        }

        let record = MovieRecord::from_payload(id, payload, Utc::now());
        self.cache.upsert(&record).await?;

        // Hand back what the store actually holds
        match self.cache.find_by_key(id).await? {
            Some(stored) => Ok(stored),
            None => Err(MovieEngineError::Cache(format!(
                "record {} missing right after upsert",
                id
            ))),
        }
    }
}
