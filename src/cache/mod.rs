pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::{MovieRecord, RecordFilter, SortKey};
use crate::error::Result;

pub use memory::MemoryRecordCache;
pub use sqlite::SqliteRecordCache;

/// Keyed persistent store of movie records
///
/// Implementations must provide atomic upsert-by-key: at most one record per
/// `external_id`, and re-upserting keeps the record's position in the natural
/// (insertion) order.
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Get a record by its external ID
    async fn find_by_key(&self, external_id: &str) -> Result<Option<MovieRecord>>;

    /// Insert or replace the record with the same external ID
    async fn upsert(&self, record: &MovieRecord) -> Result<()>;

    /// Filtered, sorted slice plus the total number of matches
    ///
    /// Records with equal sort keys keep their natural order.
    async fn query(
        &self,
        filter: &RecordFilter,
        sort: Option<SortKey>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<MovieRecord>, u64)>;

    /// Delete records written before `cutoff`, returning how many were removed
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Every record, in natural order
    async fn all(&self) -> Result<Vec<MovieRecord>>;
}
