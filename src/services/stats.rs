use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::RecordCache;
use crate::core::{MovieRecord, MovieStats, YearRuntime};
use crate::error::Result;

/// Aggregate statistics over the whole cached corpus.
///
/// Loads every record; fine for a dashboard-sized cache, not for large stores.
pub struct StatsService {
    cache: Arc<dyn RecordCache>,
}

impl StatsService {
    pub fn new(cache: Arc<dyn RecordCache>) -> Self {
        Self { cache }
    }

    pub async fn compute_stats(&self) -> Result<MovieStats> {
        let records = self.cache.all().await?;
        Ok(aggregate(&records))
    }
}

pub fn aggregate(records: &[MovieRecord]) -> MovieStats {
    let mut genre_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut rating_total = 0.0;
    let mut rating_count = 0u64;
    let mut runtime_by_year: BTreeMap<i32, (i64, u64)> = BTreeMap::new();

    for record in records {
        for genre in &record.genres {
            *genre_counts.entry(genre.clone()).or_insert(0) += 1;
        }

        if let Some(rating) = record.rating {
            rating_total += rating;
            rating_count += 1;
        }

        if let (Some(year), Some(runtime)) = (record.year, record.runtime_minutes) {
            let entry = runtime_by_year.entry(year).or_insert((0, 0));
            entry.0 += i64::from(runtime);
            entry.1 += 1;
        }
    }

    let average_rating = (rating_count > 0).then(|| rating_total / rating_count as f64);

    let average_runtime_by_year = runtime_by_year
        .into_iter()
        .map(|(year, (total, count))| YearRuntime {
            year,
            average_runtime: total as f64 / count as f64,
        })
        .collect();

    MovieStats {
        genre_counts,
        average_rating,
        average_runtime_by_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryRecordCache;

    fn movie(
        id: &str,
        genres: &[&str],
        year: Option<i32>,
        runtime: Option<i32>,
        rating: Option<f64>,
    ) -> MovieRecord {
        let mut record = MovieRecord::new(id, id);
        record.genres = genres.iter().map(|g| g.to_string()).collect();
        record.year = year;
        record.runtime_minutes = runtime;
        record.rating = rating;
        record
    }

    #[tokio::test]
    async fn test_empty_corpus() {
        let stats = StatsService::new(Arc::new(MemoryRecordCache::new()))
            .compute_stats()
            .await
            .unwrap();

        assert!(stats.genre_counts.is_empty());
        assert_eq!(stats.average_rating, None);
        assert!(stats.average_runtime_by_year.is_empty());
    }

    #[test]
    fn test_genre_counts_one_per_entry() {
        let stats = aggregate(&[
            movie("a", &["Drama", "Crime"], None, None, None),
            movie("b", &["Drama"], None, None, None),
            movie("c", &["Drama", "Drama"], None, None, None),
        ]);

        assert_eq!(stats.genre_counts["Drama"], 4);
        assert_eq!(stats.genre_counts["Crime"], 1);
    }

    #[test]
    fn test_average_rating_skips_unrated() {
        let stats = aggregate(&[
            movie("a", &[], None, None, Some(8.0)),
            movie("b", &[], None, None, None),
            movie("c", &[], None, None, Some(6.0)),
        ]);

        assert_eq!(stats.average_rating, Some(7.0));
    }

    #[test]
    fn test_runtime_by_year_needs_both_fields() {
        let stats = aggregate(&[
            movie("a", &[], Some(1999), Some(120), None),
            movie("b", &[], Some(1999), Some(100), None),
            movie("c", &[], Some(1999), None, None),
            movie("d", &[], None, Some(300), None),
            movie("e", &[], Some(1994), Some(154), None),
        ]);

        assert_eq!(
            stats.average_runtime_by_year,
            vec![
                YearRuntime { year: 1994, average_runtime: 154.0 },
                YearRuntime { year: 1999, average_runtime: 110.0 },
            ]
        );
    }
}
