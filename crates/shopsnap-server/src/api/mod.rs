mod exports;
mod scrape;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shopsnap_scraper::{ErrorKind, ExportStore, ScrapeOptions, ScraperError, StorefrontClient};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<StorefrontClient>,
    pub options: ScrapeOptions,
    pub store: ExportStore,
    /// Most recent job whose artifacts were persisted.
    pub latest_job: Arc<RwLock<Option<Uuid>>>,
}

impl AppState {
    pub fn new(client: Arc<StorefrontClient>, options: ScrapeOptions, store: ExportStore) -> Self {
        Self {
            client,
            options,
            store,
            latest_job: Arc::new(RwLock::new(None)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "bad_request" => StatusCode::BAD_REQUEST,
            "not_found" | "no_data" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::UNPROCESSABLE_ENTITY,
            "parse_error" => StatusCode::FAILED_DEPENDENCY,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "upstream_timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps a job failure to its response code. Internal failures are logged and
/// reported with a generic message.
pub(super) fn map_scraper_error(request_id: String, error: &ScraperError) -> ApiError {
    let code = match error.kind() {
        ErrorKind::InvalidInput => "bad_request",
        ErrorKind::Transport => "upstream_error",
        ErrorKind::Timeout => "upstream_timeout",
        ErrorKind::Parse => "parse_error",
        ErrorKind::Validation => "validation_error",
        ErrorKind::NoData => "no_data",
        ErrorKind::Internal => {
            tracing::error!(error = %error, "scrape job failed internally");
            return ApiError::new(request_id, "internal_error", "failed to write export");
        }
    };
    tracing::warn!(error = %error, code, "scrape job failed");
    ApiError::new(request_id, code, error.to_string())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/scrape", post(scrape::run_scrape_job))
        .route(
            "/api/v1/exports/{job_id}/products.csv",
            get(exports::download_csv),
        )
        .route(
            "/api/v1/exports/{job_id}/snapshot.json",
            get(exports::download_snapshot),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
