//! HTTP surface: processing, cached display cycle, and XML retrieval.

use crate::feed_id::{decode_component, decode_feed_id};
use crate::feed_manager::{FeedManager, FeedView};
use crate::types::{CasterError, ResultEnvelope};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const NO_STORE: &str = "no-store, max-age=0, must-revalidate";

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<FeedManager>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    fn from_caster(context: &str, e: CasterError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %e, "{}", context);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, format!("{}: {}", context, e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub previous_content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadParams {
    #[serde(default)]
    pub refresh: bool,
}

fn xml_response(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE), (header::CACHE_CONTROL, NO_STORE)],
        body,
    )
        .into_response()
}

async fn health() -> Json<HealthData> {
    Json(HealthData { status: "ok" })
}

async fn process_feeds(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    state
        .manager
        .pipeline()
        .process(&request.urls, request.previous_content.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiError::from_caster("Could not process RSS feed(s)", e))
}

async fn load_feeds(
    State(state): State<AppState>,
    Path(feed_id): Path<String>,
    Query(params): Query<LoadParams>,
) -> Result<Json<FeedView>, ApiError> {
    let urls = decode_feed_id(&feed_id).map_err(|e| ApiError::from_caster("Invalid feed ID", e))?;

    state
        .manager
        .load(&urls, params.refresh)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_caster("Could not process RSS feed(s)", e))
}

async fn feed_xml(State(state): State<AppState>, Path(feed_id): Path<String>) -> Result<Response, ApiError> {
    let url = decode_component(&feed_id).map_err(|e| ApiError::from_caster("Invalid Feed ID encoding", e))?;

    state
        .manager
        .pipeline()
        .fetch_raw(url.trim())
        .await
        .map(xml_response)
        .map_err(|e| ApiError::from_caster("Failed to retrieve feed XML", e))
}

async fn merged_feed_xml(
    State(state): State<AppState>,
    Path(multi_feed_id): Path<String>,
) -> Result<Response, ApiError> {
    let urls = decode_feed_id(&multi_feed_id).map_err(|e| ApiError::from_caster("Invalid Multi-Feed ID", e))?;

    state
        .manager
        .pipeline()
        .merged_document(&urls)
        .await
        .map(xml_response)
        .map_err(|e| ApiError::from_caster("Failed to retrieve merged feed XML", e))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/process", post(process_feeds))
        .route("/api/feeds/{feed_id}", get(load_feeds))
        .route("/api/feed-xml/{feed_id}", get(feed_xml))
        .route("/api/merged-feed-xml/{multi_feed_id}", get(merged_feed_xml))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
