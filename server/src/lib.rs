use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use seekdex_core::results::SearchResult;
use seekdex_core::{DocId, SearchConfig, SearchError, Searcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub corrected: Vec<String>,
    pub stemmed: Vec<String>,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub url: String,
    pub title: String,
}

#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<Searcher>,
}

/// Error body: `{"error": ..., "kind": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let status = match &err {
            SearchError::IndexUnavailable { .. } | SearchError::DocumentUnreadable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::CorruptIndex { .. } | SearchError::MissingDocument(_) | SearchError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        tracing::error!(error = %err, "query failed");
        ApiError { status, kind: err.kind(), message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

pub fn build_app(config: SearchConfig, timeout: Duration) -> Result<Router> {
    // Directories and vocabulary are loaded once at startup
    let searcher = Searcher::open(config)?;
    let app_state = AppState { searcher: Arc::new(searcher) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let searcher = state.searcher.clone();
    let k = params.k.unwrap_or(searcher.config().top_k).max(1).min(100);
    let query = params.q.clone();
    // index reads are blocking file IO
    let outcome = tokio::task::spawn_blocking(move || searcher.search_top(&query, k))
        .await
        .map_err(|e| ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, kind: "internal", message: e.to_string() })??;

    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        corrected: outcome.corrected,
        stemmed: outcome.stemmed,
        total_hits: outcome.total_hits,
        results: outcome.results,
    }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<DocResponse>, ApiError> {
    let searcher = state.searcher.clone();
    let described = tokio::task::spawn_blocking(move || searcher.describe(doc_id))
        .await
        .map_err(|e| ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, kind: "internal", message: e.to_string() })?;
    match described {
        Ok((url, title)) => Ok(Json(DocResponse { doc_id, url, title })),
        // a client asking for an unknown id is not an integrity failure
        Err(SearchError::MissingDocument(_)) => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: format!("document {doc_id} not found"),
        }),
        Err(e) => Err(e.into()),
    }
}
