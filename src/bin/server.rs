use axum::{
    extract::{Json, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movieflix_engine::{
    auth,
    core::parse_genre_filter,
    Authenticator, CatalogPage, CatalogQuery, EngineConfig, MovieEngine, MovieEngineError,
    MovieRecord, MovieStats, SortKey, StaticTokenAuthenticator,
};

#[derive(Clone)]
struct AppState {
    engine: Arc<MovieEngine>,
    authenticator: Arc<dyn Authenticator>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    search: Option<String>,
}

/// Raw paginated-query parameters; numbers are parsed by hand so bad input
/// maps onto the JSON error body
#[derive(Debug, Deserialize)]
struct PaginatedParams {
    search: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
    sort: Option<String>,
    filter: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct EvictResponse {
    deleted: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movieflix_server=debug,movieflix_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env()?;

    tracing::info!("Starting Movieflix engine server");
    tracing::info!("Database: {}", config.db_path);
    tracing::info!("Cache TTL: {}h", config.cache_ttl_hours);

    let engine = Arc::new(MovieEngine::open(&config).await?);

    let authenticator = StaticTokenAuthenticator::from_list(&config.admin_tokens);
    if authenticator.is_empty() {
        tracing::warn!("ADMIN_TOKENS is empty, admin routes will reject every request");
    }

    if config.evict_interval_minutes > 0 {
        spawn_eviction(engine.clone(), config.evict_interval_minutes);
    }

    let state = AppState {
        engine,
        authenticator: Arc::new(authenticator),
    };

    let app = router(state);

    tracing::info!("Server listening on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/movies", get(search_handler))
        .route("/v1/movies/:id", get(movie_handler))
        .route("/v1/movies-paginated", get(paginated_handler))
        .route("/v1/movies-csv", get(csv_handler))
        .route("/v1/stats", get(stats_handler))
        .route("/v1/cache", delete(evict_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Periodic eviction, independent of request traffic
fn spawn_eviction(engine: Arc<MovieEngine>, minutes: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(minutes * 60));
        loop {
            ticker.tick().await;
            if let Err(e) = engine.evict_expired().await {
                tracing::error!(error = %e, "scheduled eviction failed");
            }
        }
    });
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let identity = auth::authorize(state.authenticator.as_ref(), value)?;
    tracing::debug!(subject = %identity.subject, "admin request");
    Ok(())
}

fn parse_number(name: &str, raw: Option<&str>, default: usize) -> Result<usize, MovieEngineError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| MovieEngineError::Validation(format!("{} must be an integer", name)))?;
    if value < 0 {
        return Err(MovieEngineError::Validation(format!(
            "{} must not be negative",
            name
        )));
    }
    usize::try_from(value)
        .map_err(|_| MovieEngineError::Validation(format!("{} is out of range", name)))
}

fn catalog_query(params: PaginatedParams) -> Result<CatalogQuery, MovieEngineError> {
    let defaults = CatalogQuery::default();
    let sort = match params.sort.as_deref() {
        Some(raw) => SortKey::parse(raw)?,
        None => None,
    };

    Ok(CatalogQuery {
        search_term: params.search,
        limit: parse_number("limit", params.limit.as_deref(), defaults.limit)?,
        offset: parse_number("offset", params.offset.as_deref(), defaults.offset)?,
        sort,
        genre_filter: params.filter.as_deref().and_then(parse_genre_filter),
    })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: movieflix_engine::VERSION.to_string(),
    })
}

async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<MovieRecord>>, AppError> {
    let query = params.search.unwrap_or_default();
    let movies = state.engine.search_by_title(&query).await?;

    tracing::info!(query = %query, results = movies.len(), "title search");

    Ok(Json(movies))
}

async fn movie_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MovieRecord>, AppError> {
    Ok(Json(state.engine.resolve_by_id(&id).await?))
}

async fn paginated_handler(
    State(state): State<AppState>,
    Query(params): Query<PaginatedParams>,
) -> Result<Json<CatalogPage>, AppError> {
    tracing::debug!("Paginated request: {:?}", params);

    let query = catalog_query(params)?;
    let page = state.engine.query(&query).await?;

    Ok(Json(page))
}

async fn stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MovieStats>, AppError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.engine.compute_stats().await?))
}

async fn evict_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EvictResponse>, AppError> {
    require_admin(&state, &headers)?;
    let deleted = state.engine.evict_expired().await?;
    Ok(Json(EvictResponse { deleted }))
}

async fn csv_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_admin(&state, &headers)?;
    let csv = state.engine.export_csv().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"movies.csv\""),
        ],
        csv,
    )
        .into_response())
}

// Error handling
struct AppError(MovieEngineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MovieEngineError::Validation(_) => StatusCode::BAD_REQUEST,
            MovieEngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MovieEngineError::NotFound(_) | MovieEngineError::NoMatch(_) => StatusCode::NOT_FOUND,
            MovieEngineError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::error!("Error: {} - {}", status, message);
        } else {
            tracing::debug!("Rejected: {} - {}", status, message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<MovieEngineError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
