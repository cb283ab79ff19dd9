use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use crate::cache::RecordCache;
use crate::core::{MovieRecord, RecordFilter, SortKey};
use crate::error::{MovieEngineError, Result};

/// In-process record cache backed by a `Vec` in insertion order.
///
/// Nothing survives a restart; useful for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryRecordCache {
    records: Mutex<Vec<MovieRecord>>,
}

impl MemoryRecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, Vec<MovieRecord>>> {
        self.records
            .lock()
            .map_err(|_| MovieEngineError::Cache("record mutex poisoned".to_string()))
    }
}

#[async_trait]
impl RecordCache for MemoryRecordCache {
    async fn find_by_key(&self, external_id: &str) -> Result<Option<MovieRecord>> {
        let records = self.records()?;
        Ok(records
            .iter()
            .find(|r| r.external_id == external_id)
            .cloned())
    }

    async fn upsert(&self, record: &MovieRecord) -> Result<()> {
        let mut records = self.records()?;
        match records
            .iter_mut()
            .find(|r| r.external_id == record.external_id)
        {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    async fn query(
        &self,
        filter: &RecordFilter,
        sort: Option<SortKey>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<MovieRecord>, u64)> {
        let records = self.records()?;

        let mut matched: Vec<&MovieRecord> = records.iter().filter(|r| filter.matches(r)).collect();
        if let Some(key) = sort {
            // sort_by is stable, ties keep insertion order
            matched.sort_by(|a, b| key.compare(a, b));
        }

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut records = self.records()?;
        let before = records.len();
        records.retain(|r| r.cached_at >= cutoff);
        Ok((before - records.len()) as u64)
    }

    async fn all(&self) -> Result<Vec<MovieRecord>> {
        Ok(self.records()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SortField;

    #[tokio::test]
    async fn test_upsert_keeps_single_entry_in_place() {
        let cache = MemoryRecordCache::new();
        cache.upsert(&MovieRecord::new("tt1", "First")).await.unwrap();
        cache.upsert(&MovieRecord::new("tt2", "Second")).await.unwrap();
        cache.upsert(&MovieRecord::new("tt1", "First, again")).await.unwrap();

        let all = cache.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "First, again");
        assert_eq!(all[1].external_id, "tt2");
    }

    #[tokio::test]
    async fn test_query_sorts_and_counts() {
        let cache = MemoryRecordCache::new();
        for (id, runtime) in [("tt1", Some(120)), ("tt2", None), ("tt3", Some(90))] {
            let mut record = MovieRecord::new(id, "Movie");
            record.runtime_minutes = runtime;
            cache.upsert(&record).await.unwrap();
        }

        let sort = Some(SortKey::descending(SortField::Runtime));
        let (items, total) = cache
            .query(&RecordFilter::default(), sort, 0, 2)
            .await
            .unwrap();

        assert_eq!(total, 3);
        let ids: Vec<_> = items.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, vec!["tt1", "tt3"]);
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let cache = MemoryRecordCache::new();
        let mut old = MovieRecord::new("tt-old", "Old");
        old.cached_at = Utc::now() - chrono::Duration::hours(48);
        cache.upsert(&old).await.unwrap();
        cache.upsert(&MovieRecord::new("tt-new", "New")).await.unwrap();

        let deleted = cache
            .delete_older_than(Utc::now() - chrono::Duration::hours(24))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(cache.find_by_key("tt-old").await.unwrap().is_none());
        assert!(cache.find_by_key("tt-new").await.unwrap().is_some());
    }
}
