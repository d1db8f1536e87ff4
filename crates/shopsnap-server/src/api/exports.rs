use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use shopsnap_scraper::ArtifactKind;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_scraper_error, scrape::csv_attachment, ApiError, AppState};

/// Job id segment that resolves to the most recent stored job.
const LATEST: &str = "latest";

pub(super) async fn download_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let (job_id, body) = load_artifact(&state, &req_id, &job_id, ArtifactKind::Csv).await?;
    Ok(csv_attachment(body, &format!("products-{job_id}.csv")))
}

pub(super) async fn download_snapshot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let (_, body) = load_artifact(&state, &req_id, &job_id, ArtifactKind::Snapshot).await?;
    Ok((
        [(header::CONTENT_TYPE, ArtifactKind::Snapshot.content_type())],
        body,
    )
        .into_response())
}

async fn load_artifact(
    state: &AppState,
    req_id: &RequestId,
    raw_job_id: &str,
    kind: ArtifactKind,
) -> Result<(Uuid, Vec<u8>), ApiError> {
    let job_id = resolve_job_id(state, req_id, raw_job_id).await?;
    match state.store.read(job_id, kind).await {
        Ok(Some(body)) => Ok((job_id, body)),
        Ok(None) => Err(ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("job {job_id} has no {}", kind.file_name()),
        )),
        Err(e) => Err(map_scraper_error(req_id.0.clone(), &e)),
    }
}

async fn resolve_job_id(
    state: &AppState,
    req_id: &RequestId,
    raw_job_id: &str,
) -> Result<Uuid, ApiError> {
    if raw_job_id == LATEST {
        return (*state.latest_job.read().await).ok_or_else(|| {
            ApiError::new(req_id.0.clone(), "not_found", "no export has completed yet")
        });
    }
    Uuid::parse_str(raw_job_id).map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("invalid job id \"{raw_job_id}\""),
        )
    })
}
