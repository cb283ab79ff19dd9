//! Mock upstream for tests and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::core::MoviePayload;
use crate::error::{MovieEngineError, Result};
use crate::providers::UpstreamClient;

/// A configurable mock response for [`MockUpstream::fetch_by_id`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Simulate a successful fetch.
    Found(MoviePayload),
    /// Simulate an upstream "not found" with this message.
    NotFound(String),
    /// Simulate a transport failure.
    Unavailable(String),
}

/// A hand-rolled [`UpstreamClient`] with canned responses and call counting.
///
/// Unknown IDs answer `NotFound("Incorrect IMDb ID.")`, unknown queries
/// answer `NoMatch`.
#[derive(Default)]
pub struct MockUpstream {
    movies: Mutex<HashMap<String, MockResponse>>,
    searches: Mutex<HashMap<String, std::result::Result<Vec<String>, String>>>,
    fetch_calls: Mutex<HashMap<String, usize>>,
    search_calls: AtomicUsize,
    delay: Option<Duration>,
    movie_delays: Mutex<HashMap<String, Duration>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep this long in `fetch_by_id(id)` only, instead of the shared delay
    pub fn with_movie_delay(self, id: &str, delay: Duration) -> Self {
        if let Ok(mut delays) = self.movie_delays.lock() {
            delays.insert(id.to_string(), delay);
        }
        self
    }

    /// Answer `fetch_by_id(id)` with a payload titled `title`
    pub fn with_movie(self, id: &str, title: &str) -> Self {
        self.set_response(id, MockResponse::Found(MoviePayload::titled(title)));
        self
    }

    pub fn with_response(self, id: &str, response: MockResponse) -> Self {
        self.set_response(id, response);
        self
    }

    /// Answer `search_by_title(query)` (case-insensitive) with `ids`
    pub fn with_search(self, query: &str, ids: &[&str]) -> Self {
        self.set_search(query, Ok(ids.iter().map(|id| id.to_string()).collect()));
        self
    }

    /// Make `search_by_title(query)` fail as unavailable
    pub fn with_search_outage(self, query: &str, message: &str) -> Self {
        self.set_search(query, Err(message.to_string()));
        self
    }

    pub fn set_response(&self, id: &str, response: MockResponse) {
        if let Ok(mut movies) = self.movies.lock() {
            movies.insert(id.to_string(), response);
        }
    }

    fn set_search(&self, query: &str, answer: std::result::Result<Vec<String>, String>) {
        if let Ok(mut searches) = self.searches.lock() {
            searches.insert(query.to_lowercase(), answer);
        }
    }

    /// Number of `fetch_by_id` calls made for `id`
    pub fn fetch_count(&self, id: &str) -> usize {
        self.fetch_calls
            .lock()
            .map(|calls| calls.get(id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total `fetch_by_id` calls across all IDs
    pub fn total_fetches(&self) -> usize {
        self.fetch_calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    /// Number of `search_by_title` calls
    pub fn search_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn lock_error() -> MovieEngineError {
        MovieEngineError::Other("mock upstream mutex poisoned".to_string())
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    async fn fetch_by_id(&self, id: &str) -> Result<MoviePayload> {
        {
            let mut calls = self.fetch_calls.lock().map_err(|_| Self::lock_error())?;
            *calls.entry(id.to_string()).or_insert(0) += 1;
        }

        let delay = self
            .movie_delays
            .lock()
            .map_err(|_| Self::lock_error())?
            .get(id)
            .copied()
            .or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .movies
            .lock()
            .map_err(|_| Self::lock_error())?
            .get(id)
            .cloned();

        match response {
            Some(MockResponse::Found(mut payload)) => {
                if payload.raw.is_null() {
                    payload.raw = serde_json::json!({ "imdbID": id, "Title": payload.title });
                }
                Ok(payload)
            }
            Some(MockResponse::NotFound(message)) => Err(MovieEngineError::NotFound(message)),
            Some(MockResponse::Unavailable(message)) => {
                Err(MovieEngineError::upstream("mock", message))
            }
            None => Err(MovieEngineError::NotFound("Incorrect IMDb ID.".to_string())),
        }
    }

    async fn search_by_title(&self, query: &str) -> Result<Vec<String>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let answer = self
            .searches
            .lock()
            .map_err(|_| Self::lock_error())?
            .get(&query.to_lowercase())
            .cloned();

        match answer {
            Some(Ok(ids)) if !ids.is_empty() => Ok(ids),
            Some(Err(message)) => Err(MovieEngineError::upstream("mock", message)),
            _ => Err(MovieEngineError::NoMatch(query.to_string())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
