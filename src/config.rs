use std::net::SocketAddr;

use anyhow::Context;

use crate::engine::EngineOptions;
use crate::providers::omdb::DEFAULT_BASE_URL;

/// Process configuration, read from the environment (and `.env` if present)
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub addr: SocketAddr,
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub omdb_rps: u32,
    pub db_path: String,
    pub cache_ttl_hours: i64,
    pub max_concurrent_lookups: usize,
    pub admin_tokens: String,
    /// 0 disables the background eviction sweep
    pub evict_interval_minutes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8090)),
            omdb_api_key: String::new(),
            omdb_base_url: DEFAULT_BASE_URL.to_string(),
            omdb_rps: 5,
            db_path: "movieflix.db".to_string(),
            cache_ttl_hours: 24,
            max_concurrent_lookups: 10,
            admin_tokens: String::new(),
            evict_interval_minutes: 0,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8090".to_string())
            .parse()
            .context("PORT")?;

        let cache_ttl_hours: i64 = env_or("CACHE_TTL_HOURS", defaults.cache_ttl_hours);
        anyhow::ensure!(cache_ttl_hours > 0, "CACHE_TTL_HOURS must be positive");

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            omdb_api_key: std::env::var("OMDB_API_KEY").unwrap_or_default(),
            omdb_base_url: std::env::var("OMDB_BASE_URL").unwrap_or(defaults.omdb_base_url),
            omdb_rps: env_or("OMDB_RPS", defaults.omdb_rps),
            db_path: std::env::var("DB_PATH").unwrap_or(defaults.db_path),
            cache_ttl_hours,
            max_concurrent_lookups: env_or("MAX_CONCURRENT_LOOKUPS", defaults.max_concurrent_lookups),
            admin_tokens: std::env::var("ADMIN_TOKENS").unwrap_or_default(),
            evict_interval_minutes: env_or("EVICT_INTERVAL_MINUTES", defaults.evict_interval_minutes),
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            cache_ttl: chrono::Duration::hours(self.cache_ttl_hours),
            max_concurrent_lookups: self.max_concurrent_lookups,
        }
    }
}
