use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cache::RecordCache;
use crate::core::{MovieRecord, RecordFilter, SortKey};
use crate::error::{MovieEngineError, Result};

const SELECT_COLUMNS: &str = "external_id, title, year, genres, director, actors, plot, \
     poster_url, runtime_minutes, rating, cached_at, raw_payload";

/// SQLite-based record cache
///
/// ```sql
/// CREATE TABLE movies (
///     external_id TEXT PRIMARY KEY,
///     title TEXT NOT NULL,
///     title_folded TEXT NOT NULL,     -- lowercased title for substring search
///     year INTEGER,
///     genres TEXT NOT NULL,           -- JSON array
///     director TEXT,
///     actors TEXT NOT NULL,           -- JSON array
///     plot TEXT,
///     poster_url TEXT,
///     runtime_minutes INTEGER,
///     rating REAL,
///     cached_at INTEGER NOT NULL,     -- unix millis
///     raw_payload TEXT NOT NULL       -- JSON
/// );
/// ```
///
/// Natural order is `rowid`, which an upsert of an existing key keeps.
pub struct SqliteRecordCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordCache {
    /// Open (or create) the cache at `db_path`. `":memory:"` gives a private in-memory store.
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS movies (
                external_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                title_folded TEXT NOT NULL,
                year INTEGER,
                genres TEXT NOT NULL DEFAULT '[]',
                director TEXT,
                actors TEXT NOT NULL DEFAULT '[]',
                plot TEXT,
                poster_url TEXT,
                runtime_minutes INTEGER,
                rating REAL,
                cached_at INTEGER NOT NULL,
                raw_payload TEXT NOT NULL DEFAULT 'null'
            )",
            [],
        )?;

        // Eviction sweeps scan by age
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_movies_cached_at ON movies(cached_at)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MovieEngineError::Cache("connection mutex poisoned".to_string()))
    }

    /// WHERE clause and its bound parameters for `filter`
    fn where_clause(filter: &RecordFilter) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(needle) = &filter.title_contains {
            clauses.push("instr(title_folded, ?) > 0".to_string());
            values.push(Value::Text(needle.to_lowercase()));
        }

        if let Some(genres) = filter.genres.as_ref().filter(|g| !g.is_empty()) {
            let placeholders = vec!["?"; genres.len()].join(", ");
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM json_each(movies.genres) WHERE json_each.value IN ({}))",
                placeholders
            ));
            values.extend(genres.iter().cloned().map(Value::Text));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }

    fn order_clause(sort: Option<SortKey>) -> String {
        match sort {
            Some(key) => format!(
                " ORDER BY {} {}, rowid ASC",
                key.field.column(),
                if key.descending { "DESC" } else { "ASC" }
            ),
            None => " ORDER BY rowid ASC".to_string(),
        }
    }
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    let nanos = (millis.rem_euclid(1000) * 1_000_000) as u32;
    DateTime::from_timestamp(millis.div_euclid(1000), nanos)
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MovieRecord> {
    let cached_millis: i64 = row.get(10)?;
    let cached_at = millis_to_datetime(cached_millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            10,
            Type::Integer,
            format!("timestamp out of range: {}", cached_millis).into(),
        )
    })?;

    Ok(MovieRecord {
        external_id: row.get(0)?,
        title: row.get(1)?,
        year: row.get(2)?,
        genres: json_column(row, 3)?,
        director: row.get(4)?,
        actors: json_column(row, 5)?,
        plot: row.get(6)?,
        poster_url: row.get(7)?,
        runtime_minutes: row.get(8)?,
        rating: row.get(9)?,
        cached_at,
        raw_payload: json_column(row, 11)?,
    })
}

#[async_trait]
impl RecordCache for SqliteRecordCache {
    async fn find_by_key(&self, external_id: &str) -> Result<Option<MovieRecord>> {
        let conn = self.conn()?;

        let record = conn
            .query_row(
                &format!("SELECT {} FROM movies WHERE external_id = ?", SELECT_COLUMNS),
                params![external_id],
                row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    async fn upsert(&self, record: &MovieRecord) -> Result<()> {
        let genres = serde_json::to_string(&record.genres)?;
        let actors = serde_json::to_string(&record.actors)?;
        let raw = serde_json::to_string(&record.raw_payload)?;

        let conn = self.conn()?;

        // ON CONFLICT ... DO UPDATE keeps the rowid, unlike INSERT OR REPLACE
        conn.execute(
            "INSERT INTO movies (external_id, title, title_folded, year, genres, director, actors,
                                 plot, poster_url, runtime_minutes, rating, cached_at, raw_payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(external_id) DO UPDATE SET
                title = excluded.title,
                title_folded = excluded.title_folded,
                year = excluded.year,
                genres = excluded.genres,
                director = excluded.director,
                actors = excluded.actors,
                plot = excluded.plot,
                poster_url = excluded.poster_url,
                runtime_minutes = excluded.runtime_minutes,
                rating = excluded.rating,
                cached_at = excluded.cached_at,
                raw_payload = excluded.raw_payload",
            params![
                record.external_id,
                record.title,
                record.title.to_lowercase(),
                record.year,
                genres,
                record.director,
                actors,
                record.plot,
                record.poster_url,
                record.runtime_minutes,
                record.rating,
                record.cached_at.timestamp_millis(),
                raw,
            ],
        )?;

        Ok(())
    }

    async fn query(
        &self,
        filter: &RecordFilter,
        sort: Option<SortKey>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<MovieRecord>, u64)> {
        let (where_sql, values) = Self::where_clause(filter);
        let conn = self.conn()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM movies{}", where_sql),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM movies{}{} LIMIT ? OFFSET ?",
            SELECT_COLUMNS,
            where_sql,
            Self::order_clause(sort)
        );

        let mut page_values = values;
        page_values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        page_values.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(page_values.iter()), row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((items, total.max(0) as u64))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.conn()?;

        let deleted = conn.execute(
            "DELETE FROM movies WHERE cached_at < ?",
            params![cutoff.timestamp_millis()],
        )?;

        Ok(deleted as u64)
    }

    async fn all(&self) -> Result<Vec<MovieRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM movies ORDER BY rowid ASC",
            SELECT_COLUMNS
        ))?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SortField;

    fn movie(id: &str, title: &str, genres: &[&str]) -> MovieRecord {
        let mut record = MovieRecord::new(id, title);
        record.genres = genres.iter().map(|g| g.to_string()).collect();
        record
    }

    async fn seeded() -> SqliteRecordCache {
        let cache = SqliteRecordCache::new(":memory:").await.unwrap();

        let mut a = movie("tt1", "Alien", &["Horror", "Sci-Fi"]);
        a.year = Some(1979);
        a.rating = Some(8.5);
        let mut b = movie("tt2", "Aliens", &["Action", "Sci-Fi"]);
        b.year = Some(1986);
        b.rating = Some(8.4);
        let mut c = movie("tt3", "Annie Hall", &["Comedy", "Romance"]);
        c.year = Some(1977);
        let mut d = movie("tt4", "Amélie", &["Comedy"]);
        d.year = Some(2001);
        d.rating = Some(8.3);

        for record in [&a, &b, &c, &d] {
            cache.upsert(record).await.unwrap();
        }
        cache
    }

    #[tokio::test]
    async fn test_cache_create() {
        let cache = SqliteRecordCache::new(":memory:").await.unwrap();
        assert!(cache.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let cache = SqliteRecordCache::new(":memory:").await.unwrap();

        let mut record = movie("tt0133093", "The Matrix", &["Action", "Sci-Fi"]);
        record.year = Some(1999);
        record.actors = vec!["Keanu Reeves".into(), "Laurence Fishburne".into()];
        record.runtime_minutes = Some(136);
        record.rating = Some(8.7);
        record.raw_payload = serde_json::json!({"Title": "The Matrix"});

        cache.upsert(&record).await.unwrap();

        let found = cache.find_by_key("tt0133093").await.unwrap().unwrap();
        assert_eq!(found.title, "The Matrix");
        assert_eq!(found.genres, vec!["Action", "Sci-Fi"]);
        assert_eq!(found.actors.len(), 2);
        assert_eq!(found.runtime_minutes, Some(136));
        assert_eq!(found.rating, Some(8.7));
        assert_eq!(found.raw_payload["Title"], "The Matrix");
        assert_eq!(
            found.cached_at.timestamp_millis(),
            record.cached_at.timestamp_millis()
        );

        assert!(cache.find_by_key("tt-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_without_duplicating() {
        let cache = seeded().await;

        let mut updated = movie("tt1", "Alien", &["Horror", "Sci-Fi"]);
        updated.year = Some(1979);
        updated.rating = Some(8.5);
        updated.cached_at = Utc::now() + chrono::Duration::seconds(5);
        cache.upsert(&updated).await.unwrap();

        let all = cache.all().await.unwrap();
        assert_eq!(all.len(), 4);
        // Natural order is unchanged by the refresh
        assert_eq!(all[0].external_id, "tt1");
        assert_eq!(
            all[0].cached_at.timestamp_millis(),
            updated.cached_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_query_title_substring_case_insensitive() {
        let cache = seeded().await;

        let filter = RecordFilter {
            title_contains: Some("ALIEN".to_string()),
            genres: None,
        };
        let (items, total) = cache.query(&filter, None, 0, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].external_id, "tt1");
        assert_eq!(items[1].external_id, "tt2");

        let filter = RecordFilter {
            title_contains: Some("amélie".to_string()),
            genres: None,
        };
        let (_, total) = cache.query(&filter, None, 0, 10).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_query_search_term_is_literal() {
        let cache = seeded().await;

        let filter = RecordFilter {
            title_contains: Some("a%".to_string()),
            genres: None,
        };
        let (_, total) = cache.query(&filter, None, 0, 10).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_query_genre_intersection() {
        let cache = seeded().await;

        let filter = RecordFilter {
            title_contains: None,
            genres: Some(vec!["Comedy".to_string(), "Action".to_string()]),
        };
        let (items, total) = cache.query(&filter, None, 0, 10).await.unwrap();
        assert_eq!(total, 3);
        let ids: Vec<_> = items.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, vec!["tt2", "tt3", "tt4"]);
    }

    #[tokio::test]
    async fn test_query_sort_and_paginate() {
        let cache = seeded().await;

        let sort = Some(SortKey::descending(SortField::Year));
        let (items, total) = cache
            .query(&RecordFilter::default(), sort, 1, 2)
            .await
            .unwrap();
        assert_eq!(total, 4);
        let ids: Vec<_> = items.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, vec!["tt2", "tt1"]);
    }

    #[tokio::test]
    async fn test_query_sort_ties_keep_natural_order() {
        let cache = SqliteRecordCache::new(":memory:").await.unwrap();
        for id in ["tt9", "tt5", "tt7"] {
            let mut record = movie(id, "Same", &[]);
            record.year = Some(2000);
            cache.upsert(&record).await.unwrap();
        }

        for sort in [
            SortKey::ascending(SortField::Year),
            SortKey::descending(SortField::Year),
        ] {
            let (items, _) = cache
                .query(&RecordFilter::default(), Some(sort), 0, 10)
                .await
                .unwrap();
            let ids: Vec<_> = items.iter().map(|r| r.external_id.as_str()).collect();
            assert_eq!(ids, vec!["tt9", "tt5", "tt7"]);
        }
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let cache = SqliteRecordCache::new(":memory:").await.unwrap();

        let mut old = movie("tt-old", "Old", &[]);
        old.cached_at = Utc::now() - chrono::Duration::days(3);
        let fresh = movie("tt-new", "New", &[]);
        cache.upsert(&old).await.unwrap();
        cache.upsert(&fresh).await.unwrap();

        let deleted = cache
            .delete_older_than(Utc::now() - chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let all = cache.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].external_id, "tt-new");
    }
}
