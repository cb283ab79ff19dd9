use thiserror::Error;

/// Main error type for the movie engine
#[derive(Error, Debug)]
pub enum MovieEngineError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No such external ID upstream (message comes from the upstream)
    #[error("Movie not found: {0}")]
    NotFound(String),

    /// Title search returned nothing usable
    #[error("No results found for query: {0}")]
    NoMatch(String),

    /// Network, timeout or non-2xx failure talking to the upstream
    #[error("Upstream '{provider}' unavailable: {message}")]
    UpstreamUnavailable { provider: String, message: String },

    /// Malformed caller input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl MovieEngineError {
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        MovieEngineError::UpstreamUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MovieEngineError>;
