use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shopsnap_scraper::{run_scrape, ArtifactKind, FetchFailure, ScrapeRequest, SkippedRecord};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_scraper_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeQuery {
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    Confirmation,
    Csv,
}

impl ResponseFormat {
    fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("" | "json") => Some(Self::Confirmation),
            Some(f) if f.eq_ignore_ascii_case("csv") => Some(Self::Csv),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ArtifactLinks {
    csv: Option<String>,
    snapshot: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeConfirmation {
    job_id: Uuid,
    shop_url: String,
    product_count: usize,
    row_count: usize,
    homepage_scraped: bool,
    key_page_count: usize,
    skipped: Vec<SkippedRecord>,
    fetch_failures: Vec<FetchFailure>,
    artifacts: ArtifactLinks,
}

pub(super) fn download_path(job_id: Uuid, kind: ArtifactKind) -> String {
    format!("/api/v1/exports/{job_id}/{}", kind.file_name())
}

pub(super) async fn run_scrape_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeQuery>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "bad_request", rejection.body_text())
    })?;
    let format = ResponseFormat::parse(query.format.as_deref()).ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            "format must be \"json\" or \"csv\"",
        )
    })?;

    let output = run_scrape(&state.client, &state.options, &request)
        .await
        .map_err(|e| map_scraper_error(req_id.0.clone(), &e))?;
    if format == ResponseFormat::Csv && output.rows.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "no_data",
            "job produced no product rows to return as CSV",
        ));
    }

    let job_id = Uuid::new_v4();
    let saved = state
        .store
        .save(job_id, &output.rows, &output.snapshot)
        .await
        .map_err(|e| map_scraper_error(req_id.0.clone(), &e))?;
    *state.latest_job.write().await = Some(job_id);

    tracing::info!(
        %job_id,
        shop_url = %output.snapshot.shop_url,
        rows = output.rows.len(),
        "scrape job stored"
    );

    if format == ResponseFormat::Csv {
        let body = match state.store.read(job_id, ArtifactKind::Csv).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                tracing::error!(%job_id, "saved CSV missing right after write");
                return Err(ApiError::new(
                    req_id.0,
                    "internal_error",
                    "failed to read export",
                ));
            }
            Err(e) => return Err(map_scraper_error(req_id.0, &e)),
        };
        return Ok(csv_attachment(body, &format!("products-{job_id}.csv")));
    }

    let data = ScrapeConfirmation {
        job_id,
        shop_url: output.snapshot.shop_url,
        product_count: output.snapshot.products.len(),
        row_count: output.rows.len(),
        homepage_scraped: output.snapshot.homepage.is_some(),
        key_page_count: output.snapshot.key_pages.len(),
        skipped: output.skipped,
        fetch_failures: output.fetch_failures,
        artifacts: ArtifactLinks {
            csv: saved
                .csv
                .map(|_| download_path(job_id, ArtifactKind::Csv)),
            snapshot: download_path(job_id, ArtifactKind::Snapshot),
        },
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
    .into_response())
}

pub(super) fn csv_attachment(body: Vec<u8>, file_name: &str) -> Response {
    (
        [
            (
                header::CONTENT_TYPE,
                ArtifactKind::Csv.content_type().to_owned(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}
