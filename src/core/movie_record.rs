use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached movie, keyed by its upstream identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    /// Upstream identifier (IMDb ID for OMDb). Identity key.
    pub external_id: String,

    pub title: String,

    #[serde(default)]
    pub year: Option<i32>,

    /// Genre(s), in upstream order
    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default)]
    pub director: Option<String>,

    #[serde(default)]
    pub actors: Vec<String>,

    #[serde(default)]
    pub plot: Option<String>,

    #[serde(default)]
    pub poster_url: Option<String>,

    #[serde(default)]
    pub runtime_minutes: Option<i32>,

    /// User rating (0.0-10.0)
    #[serde(default)]
    pub rating: Option<f64>,

    /// Last write time; drives TTL expiry
    pub cached_at: DateTime<Utc>,

    /// Untouched upstream response
    #[serde(default)]
    pub raw_payload: serde_json::Value,
}

/// Upstream-neutral movie payload, as parsed by an [`UpstreamClient`](crate::providers::UpstreamClient)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoviePayload {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub director: Option<String>,
    pub actors: Vec<String>,
    pub plot: Option<String>,
    pub poster_url: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub rating: Option<f64>,
    pub raw: serde_json::Value,
}

impl MoviePayload {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl MovieRecord {
    /// Create a record with only the required fields set
    pub fn new(external_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            year: None,
            genres: Vec::new(),
            director: None,
            actors: Vec::new(),
            plot: None,
            poster_url: None,
            runtime_minutes: None,
            rating: None,
            cached_at: Utc::now(),
            raw_payload: serde_json::Value::Null,
        }
    }

    /// Build the record stored for `external_id` from an upstream payload.
    ///
    /// A payload without a title is accepted and stored with an empty title.
    pub fn from_payload(
        external_id: impl Into<String>,
        payload: MoviePayload,
        cached_at: DateTime<Utc>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            title: payload.title.unwrap_or_default(),
            year: payload.year,
            genres: payload.genres,
            director: payload.director,
            actors: payload.actors,
            plot: payload.plot,
            poster_url: payload.poster_url,
            runtime_minutes: payload.runtime_minutes,
            rating: payload.rating,
            cached_at,
            raw_payload: payload.raw,
        }
    }

    /// Whether the record was written less than `ttl` before `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.cached_at < ttl
    }

    pub fn has_any_genre(&self, wanted: &[String]) -> bool {
        self.genres.iter().any(|g| wanted.contains(g))
    }

    /// Get display name (for logging/UI)
    pub fn display_name(&self) -> String {
        if let Some(year) = self.year {
            format!("{} ({})", self.title, year)
        } else {
            self.title.clone()
        }
    }
}
