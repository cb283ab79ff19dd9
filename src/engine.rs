use chrono::Utc;
use std::sync::Arc;

use crate::cache::{RecordCache, SqliteRecordCache};
use crate::config::EngineConfig;
use crate::core::{CatalogPage, CatalogQuery, MovieRecord, MovieStats};
use crate::error::Result;
use crate::export;
use crate::providers::{OmdbClient, UpstreamClient};
use crate::services::{CatalogQueryService, LookupService, SearchService, StatsService};

/// Main movie engine: wires the services over one cache and one upstream
pub struct MovieEngine {
    cache: Arc<dyn RecordCache>,
    lookup: Arc<LookupService>,
    search: Arc<SearchService>,
    catalog: CatalogQueryService,
    stats: StatsService,
    options: EngineOptions,
}

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Age after which a cached record is refetched and becomes evictable
    pub cache_ttl: chrono::Duration,
    /// Concurrent lookups per title search
    pub max_concurrent_lookups: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_ttl: chrono::Duration::hours(24),
            max_concurrent_lookups: 10,
        }
    }
}

impl MovieEngine {
    /// Create an engine over explicit cache and upstream implementations
    pub fn new(
        cache: Arc<dyn RecordCache>,
        upstream: Arc<dyn UpstreamClient>,
        options: EngineOptions,
    ) -> Self {
        let lookup = Arc::new(LookupService::new(
            cache.clone(),
            upstream.clone(),
            options.cache_ttl,
        ));
        let search = Arc::new(SearchService::new(
            upstream,
            lookup.clone(),
            options.max_concurrent_lookups,
        ));
        let catalog = CatalogQueryService::new(cache.clone(), search.clone());
        let stats = StatsService::new(cache.clone());

        Self {
            cache,
            lookup,
            search,
            catalog,
            stats,
            options,
        }
    }

    /// Create the production engine: SQLite cache at `db_path` + OMDb upstream
    pub async fn open(config: &EngineConfig) -> Result<Self> {
        let cache = Arc::new(SqliteRecordCache::new(&config.db_path).await?);
        let upstream = Arc::new(OmdbClient::new(
            config.omdb_api_key.clone(),
            config.omdb_base_url.clone(),
            config.omdb_rps,
        )?);

        tracing::info!(
            db_path = %config.db_path,
            ttl_hours = config.cache_ttl_hours,
            "movie engine ready"
        );

        Ok(Self::new(cache, upstream, config.engine_options()))
    }

    /// Resolve one movie by external ID (cache-or-fetch)
    pub async fn resolve_by_id(&self, id: &str) -> Result<MovieRecord> {
        self.lookup.resolve(id).await
    }

    /// Title search against the upstream, hydrating every candidate
    pub async fn search_by_title(&self, query: &str) -> Result<Vec<MovieRecord>> {
        self.search.search_by_title(query).await
    }

    /// Paginated catalog query over the local cache
    pub async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage> {
        self.catalog.query(query).await
    }

    /// Get corpus statistics
    pub async fn compute_stats(&self) -> Result<MovieStats> {
        self.stats.compute_stats().await
    }

    /// Delete records older than the TTL
    pub async fn evict_expired(&self) -> Result<u64> {
        let cutoff = Utc::now() - self.options.cache_ttl;
        let deleted = self.cache.delete_older_than(cutoff).await?;
        tracing::info!(deleted, cutoff = %cutoff, "evicted expired records");
        Ok(deleted)
    }

    /// Whole catalog as CSV
    pub async fn export_csv(&self) -> Result<String> {
        let records = self.cache.all().await?;
        Ok(export::records_to_csv(&records))
    }
}
