//! # Movieflix Engine
//!
//! Cache-backed movie metadata engine with:
//! - Lookup by external ID with a TTL-bounded local cache
//! - Title search that hydrates every upstream candidate concurrently
//! - Paginated, sorted, genre-filtered catalog queries with upstream fallback
//! - Corpus statistics and CSV export
//! - Multiple interfaces: Rust library, HTTP API, CLI
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use movieflix_engine::{CatalogQuery, EngineConfig, MovieEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::from_env()?;
//!     let engine = MovieEngine::open(&config).await?;
//!
//!     let page = engine.query(&CatalogQuery {
//!         search_term: Some("heat".to_string()),
//!         ..CatalogQuery::default()
//!     }).await?;
//!
//!     println!("{} of {} movies", page.items.len(), page.total);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod export;
pub mod providers;
pub mod services;

// Re-export primary types
pub use auth::{Authenticator, Identity, StaticTokenAuthenticator};
pub use cache::RecordCache;
pub use config::EngineConfig;
pub use core::{CatalogPage, CatalogQuery, MovieRecord, MovieStats, SortField, SortKey};
pub use engine::{EngineOptions, MovieEngine};
pub use error::{MovieEngineError, Result};
pub use providers::UpstreamClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
