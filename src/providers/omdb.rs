use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::core::MoviePayload;
use crate::error::{MovieEngineError, Result};
use crate::providers::UpstreamClient;

pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

const PROVIDER: &str = "omdb";

/// OMDb error messages that mean the service itself refused the call
const SERVICE_ERRORS: &[&str] = &[
    "Invalid API key!",
    "No API key provided.",
    "Request limit reached!",
];

/// OMDb (Open Movie Database) API client
pub struct OmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    limiter: Arc<DefaultDirectRateLimiter>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct OmdbMovie {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    actors: Option<String>,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    runtime: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchItem>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

impl OmdbClient {
    /// Create new OMDb client, limited to `rps` requests per second
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, rps: u32) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            tracing::warn!("No OMDB_API_KEY configured, upstream calls will be rejected");
        }

        let client = Client::builder()
            .user_agent(concat!("movieflix-engine/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MovieEngineError::upstream(PROVIDER, format!("HTTP client setup failed: {}", e)))?;

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
            limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Issue one GET against the API and return the decoded JSON body
    async fn get_json(&self, params: &str) -> Result<serde_json::Value> {
        self.limiter.until_ready().await;

        let url = format!(
            "{}?apikey={}&{}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            params
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MovieEngineError::upstream(PROVIDER, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(MovieEngineError::upstream(
                PROVIDER,
                format!("HTTP {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| MovieEngineError::upstream(PROVIDER, format!("Invalid JSON: {}", e)))
    }
}

/// `Some(message)` when the body is an OMDb error envelope (`"Response": "False"`)
fn error_message(body: &serde_json::Value) -> Option<String> {
    if body.get("Response").and_then(|r| r.as_str()) != Some("False") {
        return None;
    }
    Some(
        body.get("Error")
            .and_then(|e| e.as_str())
            .unwrap_or("Unknown upstream error")
            .to_string(),
    )
}

/// Trimmed value with OMDb's `N/A` placeholder treated as absent
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

/// Leading integer of strings like `"1999"`, `"2010–2013"` or `"136 min"`
fn leading_int(value: &str) -> Option<i32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn split_list(value: Option<String>) -> Vec<String> {
    present(value)
        .map(|v| {
            v.split(',')
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Convert an OMDb movie body into a payload
fn parse_movie(body: serde_json::Value) -> Result<MoviePayload> {
    let movie: OmdbMovie = serde_json::from_value(body.clone())
        .map_err(|e| MovieEngineError::upstream(PROVIDER, format!("Unexpected payload: {}", e)))?;

    Ok(MoviePayload {
        title: present(movie.title),
        year: present(movie.year).and_then(|y| leading_int(&y)),
        genres: split_list(movie.genre),
        director: present(movie.director),
        actors: split_list(movie.actors),
        plot: present(movie.plot),
        poster_url: present(movie.poster),
        runtime_minutes: present(movie.runtime).and_then(|r| leading_int(&r)),
        rating: present(movie.imdb_rating).and_then(|r| r.parse::<f64>().ok()),
        raw: body,
    })
}

/// Candidate IDs from an OMDb search body
fn parse_search(query: &str, body: serde_json::Value) -> Result<Vec<String>> {
    if let Some(message) = error_message(&body) {
        if SERVICE_ERRORS.contains(&message.as_str()) {
            return Err(MovieEngineError::upstream(PROVIDER, message));
        }
        return Err(MovieEngineError::NoMatch(format!("{} ({})", query, message)));
    }

    let response: OmdbSearchResponse = serde_json::from_value(body)
        .map_err(|e| MovieEngineError::upstream(PROVIDER, format!("Unexpected payload: {}", e)))?;

    let ids: Vec<String> = response.search.into_iter().map(|item| item.imdb_id).collect();
    if ids.is_empty() {
        return Err(MovieEngineError::NoMatch(query.to_string()));
    }
    Ok(ids)
}

#[async_trait]
impl UpstreamClient for OmdbClient {
    async fn fetch_by_id(&self, id: &str) -> Result<MoviePayload> {
        let body = self
            .get_json(&format!("i={}&plot=short", urlencoding::encode(id)))
            .await?;

        if let Some(message) = error_message(&body) {
            return Err(MovieEngineError::NotFound(message));
        }

        parse_movie(body)
    }

    async fn search_by_title(&self, query: &str) -> Result<Vec<String>> {
        let body = self
            .get_json(&format!("s={}", urlencoding::encode(query)))
            .await?;

        parse_search(query, body)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matrix_body() -> serde_json::Value {
        json!({
            "Title": "The Matrix",
            "Year": "1999",
            "Runtime": "136 min",
            "Genre": "Action, Sci-Fi",
            "Director": "Lana Wachowski, Lilly Wachowski",
            "Actors": "Keanu Reeves, Laurence Fishburne, Carrie-Anne Moss",
            "Plot": "When a beautiful stranger leads computer hacker Neo...",
            "Poster": "https://m.media-amazon.com/images/M/matrix.jpg",
            "imdbRating": "8.7",
            "imdbID": "tt0133093",
            "Type": "movie",
            "Response": "True"
        })
    }

    #[test]
    fn test_parse_movie() {
        let payload = parse_movie(matrix_body()).unwrap();

        assert_eq!(payload.title.as_deref(), Some("The Matrix"));
        assert_eq!(payload.year, Some(1999));
        assert_eq!(payload.runtime_minutes, Some(136));
        assert_eq!(payload.genres, vec!["Action", "Sci-Fi"]);
        assert_eq!(payload.actors.len(), 3);
        assert_eq!(payload.rating, Some(8.7));
        assert_eq!(payload.raw["imdbID"], "tt0133093");
    }

    #[test]
    fn test_parse_movie_placeholders() {
        let body = json!({
            "Title": "Obscure Short",
            "Year": "2015–2016",
            "Runtime": "N/A",
            "Genre": "N/A",
            "Director": "N/A",
            "imdbRating": "N/A",
            "Response": "True"
        });
        let payload = parse_movie(body).unwrap();

        assert_eq!(payload.year, Some(2015));
        assert_eq!(payload.runtime_minutes, None);
        assert!(payload.genres.is_empty());
        assert_eq!(payload.director, None);
        assert_eq!(payload.rating, None);
    }

    #[test]
    fn test_parse_movie_without_title() {
        let payload = parse_movie(json!({"Year": "2001", "Response": "True"})).unwrap();
        assert_eq!(payload.title, None);
        assert_eq!(payload.year, Some(2001));
    }

    #[test]
    fn test_error_envelope() {
        let body = json!({"Response": "False", "Error": "Incorrect IMDb ID."});
        assert_eq!(error_message(&body).as_deref(), Some("Incorrect IMDb ID."));
        assert_eq!(error_message(&matrix_body()), None);
    }

    #[test]
    fn test_parse_search_keeps_upstream_order() {
        let body = json!({
            "Search": [
                {"Title": "Alien", "imdbID": "tt0078748"},
                {"Title": "Aliens", "imdbID": "tt0090605"},
                {"Title": "Alien 3", "imdbID": "tt0103644"}
            ],
            "totalResults": "3",
            "Response": "True"
        });

        let ids = parse_search("alien", body).unwrap();
        assert_eq!(ids, vec!["tt0078748", "tt0090605", "tt0103644"]);
    }

    #[test]
    fn test_parse_search_error_kinds() {
        let not_found = json!({"Response": "False", "Error": "Movie not found!"});
        assert!(matches!(
            parse_search("zzz", not_found),
            Err(MovieEngineError::NoMatch(_))
        ));

        let bad_key = json!({"Response": "False", "Error": "Invalid API key!"});
        assert!(matches!(
            parse_search("zzz", bad_key),
            Err(MovieEngineError::UpstreamUnavailable { .. })
        ));
    }

    #[tokio::test]
    #[ignore] // Requires network access and OMDB_API_KEY
    async fn test_omdb_fetch_by_id() {
        let key = std::env::var("OMDB_API_KEY").unwrap();
        let client = OmdbClient::new(key, DEFAULT_BASE_URL, 1).unwrap();
        let payload = client.fetch_by_id("tt0133093").await.unwrap();

        assert_eq!(payload.title.as_deref(), Some("The Matrix"));
    }

    #[tokio::test]
    #[ignore] // Requires network access and OMDB_API_KEY
    async fn test_omdb_search() {
        let key = std::env::var("OMDB_API_KEY").unwrap();
        let client = OmdbClient::new(key, DEFAULT_BASE_URL, 1).unwrap();
        let ids = client.search_by_title("matrix").await.unwrap();

        assert!(ids.contains(&"tt0133093".to_string()));
    }
}
