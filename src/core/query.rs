use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::core::MovieRecord;
use crate::error::{MovieEngineError, Result};

/// Fields the catalog can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Title,
    Year,
    Rating,
    Runtime,
    Director,
    CachedAt,
    ExternalId,
}

impl SortField {
    /// Parse a sort field name. Accepts the camelCase record names and the
    /// legacy dashboard names (`runtime`, `imdbID`).
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "title" => Ok(SortField::Title),
            "year" => Ok(SortField::Year),
            "rating" => Ok(SortField::Rating),
            "runtime" | "runtimeMinutes" => Ok(SortField::Runtime),
            "director" => Ok(SortField::Director),
            "cachedAt" => Ok(SortField::CachedAt),
            "imdbID" | "externalId" => Ok(SortField::ExternalId),
            other => Err(MovieEngineError::Validation(format!(
                "unsupported sort field '{}'",
                other
            ))),
        }
    }

    /// SQLite column backing this field
    pub fn column(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Year => "year",
            SortField::Rating => "rating",
            SortField::Runtime => "runtime_minutes",
            SortField::Director => "director",
            SortField::CachedAt => "cached_at",
            SortField::ExternalId => "external_id",
        }
    }

    /// Ascending comparison; absent values sort first
    pub fn compare(self, a: &MovieRecord, b: &MovieRecord) -> Ordering {
        match self {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Year => a.year.cmp(&b.year),
            SortField::Rating => match (a.rating, b.rating) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (x, y) => x.is_some().cmp(&y.is_some()),
            },
            SortField::Runtime => a.runtime_minutes.cmp(&b.runtime_minutes),
            SortField::Director => a.director.cmp(&b.director),
            SortField::CachedAt => a.cached_at.cmp(&b.cached_at),
            SortField::ExternalId => a.external_id.cmp(&b.external_id),
        }
    }
}

/// Sort field plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(field: SortField) -> Self {
        Self { field, descending: false }
    }

    pub fn descending(field: SortField) -> Self {
        Self { field, descending: true }
    }

    /// Parse `"year"` / `"-year"`. Blank input means no sort.
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let (name, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        Ok(Some(Self {
            field: SortField::parse(name)?,
            descending,
        }))
    }

    /// Comparison honouring direction. Equal keys compare equal so a stable
    /// sort keeps the store's natural order.
    pub fn compare(&self, a: &MovieRecord, b: &MovieRecord) -> Ordering {
        let ord = self.field.compare(a, b);
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Parse the dashboard filter syntax `genre:Comedy,Drama`.
///
/// Returns `None` for anything that is not a non-empty genre filter.
pub fn parse_genre_filter(raw: &str) -> Option<Vec<String>> {
    let list = raw.trim().strip_prefix("genre:")?;
    let genres: Vec<String> = list
        .split(',')
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();

    if genres.is_empty() {
        None
    } else {
        Some(genres)
    }
}

/// Predicate evaluated by a [`RecordCache`](crate::cache::RecordCache) query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Case-insensitive literal substring of the title
    pub title_contains: Option<String>,
    /// Match records having at least one of these genres
    pub genres: Option<Vec<String>>,
}

impl RecordFilter {
    pub fn matches(&self, record: &MovieRecord) -> bool {
        if let Some(needle) = &self.title_contains {
            if !record.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(genres) = &self.genres {
            if !record.has_any_genre(genres) {
                return false;
            }
        }
        true
    }
}

/// Paginated catalog query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    #[serde(default)]
    pub search_term: Option<String>,
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub genre_filter: Option<Vec<String>>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search_term: None,
            limit: 10,
            offset: 0,
            sort: None,
            genre_filter: None,
        }
    }
}

impl CatalogQuery {
    /// Search term with blanks treated as absent
    pub fn effective_search_term(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(MovieEngineError::Validation(
                "limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn filter(&self) -> RecordFilter {
        RecordFilter {
            title_contains: self.effective_search_term().map(str::to_string),
            genres: self.genre_filter.clone().filter(|g| !g.is_empty()),
        }
    }
}

/// One page of catalog results plus the full match count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub items: Vec<MovieRecord>,
    pub total: u64,
}

impl CatalogPage {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
