use std::{io::ErrorKind, path::Path, sync::Arc};

use axum::{
    extract::{Path as UriPath, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use supercookie_core::{ServerConfig, StatsSnapshot, SupercookieError, TrackingRegistry};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::{
    dispatch::{self, Validators},
    error::RouteError,
};

pub const TRACKER_PAGE: &str = "tracker.html";
pub const PROBE_PAGE: &str = "probe.html";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Shared by every handler; handlers themselves keep no state.
pub struct AppState {
    pub registry: Arc<TrackingRegistry>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(registry: Arc<TrackingRegistry>, config: ServerConfig) -> Arc<Self> {
        Arc::new(Self { registry, config })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any);

    Router::new()
        .route("/set-favicon.bmp", get(set_favicon_handler))
        .route("/probe/", get(missing_probe_index_handler))
        .route("/probe/{*rest}", get(probe_handler))
        .route("/track", get(track_page_handler))
        .route("/probe", get(probe_page_handler))
        .route("/stats", get(stats_handler).layer(cors))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn set_favicon_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    // A repeated `tid` takes its first value.
    let tid = params
        .iter()
        .find_map(|(key, value)| (key == "tid").then_some(value.as_str()));
    let validators = Validators::from_headers(&headers);
    dispatch::set_favicon(&state.registry, tid, &validators)
        .reply
        .into_response()
}

async fn probe_handler(
    State(state): State<Arc<AppState>>,
    UriPath(rest): UriPath<String>,
    headers: HeaderMap,
) -> Result<Response, RouteError> {
    let index = dispatch::probe_index(&rest)?;
    let validators = Validators::from_headers(&headers);
    let result = dispatch::probe(&state.registry, index, &validators)?;

    Ok(result.reply.into_response())
}

async fn missing_probe_index_handler() -> RouteError {
    RouteError::MalformedProbe
}

async fn track_page_handler(State(state): State<Arc<AppState>>) -> Result<Response, RouteError> {
    serve_asset(&state.config.assets_dir, TRACKER_PAGE).await
}

async fn probe_page_handler(State(state): State<Arc<AppState>>) -> Result<Response, RouteError> {
    serve_asset(&state.config.assets_dir, PROBE_PAGE).await
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.registry.snapshot())
}

async fn not_found_handler() -> RouteError {
    RouteError::NotFound
}

async fn serve_asset(dir: &Path, name: &str) -> Result<Response, RouteError> {
    let path = dir.join(name);

    match tokio::fs::read(&path).await {
        Ok(content) => Ok((StatusCode::OK, [(CONTENT_TYPE, HTML_CONTENT_TYPE)], content).into_response()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Asset {} missing", path.display());
            Err(RouteError::AssetNotFound(name.to_string()))
        }
        Err(e) => Err(SupercookieError::from(e).into()),
    }
}
