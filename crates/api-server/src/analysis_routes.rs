use analysis_client::{AnalysisClientError, AnalysisReport, JobStatus};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: String,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisStatusResponse {
    Pending,
    Done { report: AnalysisReport },
}

pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analysis", post(submit_analysis))
        .route("/api/analysis/:job_id", get(get_analysis_status))
}

fn analysis_err(e: AnalysisClientError) -> AppError {
    match e {
        AnalysisClientError::InvalidRequest(message) => AppError::bad_request(message),
        e if e.is_transient() => AppError::with_status(StatusCode::BAD_GATEWAY, e),
        other => AppError::with_status(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}

#[utoipa::path(
    post,
    path = "/api/analysis",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Job accepted", body = JobAccepted),
        (status = 400, description = "Prompt or ticker missing", body = crate::ErrorBody),
        (status = 500, description = "Workflow unavailable", body = crate::ErrorBody)
    ),
    tag = "Analysis"
)]
async fn submit_analysis(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<JobAccepted>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;

    let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let (Some(prompt), Some(ticker)) = (present(request.prompt), present(request.ticker)) else {
        return Err(AppError::bad_request("Prompt and ticker are required"));
    };

    let job_id = state
        .analysis
        .submit(&ticker, &prompt)
        .await
        .map_err(|e| match e {
            // Submissions are never retried, so a transport failure is a 500 here
            AnalysisClientError::InvalidRequest(message) => AppError::bad_request(message),
            other => AppError::with_status(StatusCode::INTERNAL_SERVER_ERROR, other),
        })?;

    Ok(Json(JobAccepted { job_id }))
}

/// One status check, for callers that drive their own poll loop.
#[utoipa::path(
    get,
    path = "/api/analysis/{job_id}",
    params(("job_id" = String, Path, description = "Job id returned on submission")),
    responses(
        (status = 200, description = "Pending, or done with the normalized report", body = AnalysisStatusResponse),
        (status = 500, description = "Job failed or result unreadable", body = crate::ErrorBody),
        (status = 502, description = "Status check failed; retry later", body = crate::ErrorBody)
    ),
    tag = "Analysis"
)]
async fn get_analysis_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<AnalysisStatusResponse>, AppError> {
    let status = state
        .analysis
        .check_status(&job_id)
        .await
        .map_err(analysis_err)?;

    match status {
        JobStatus::Pending => Ok(Json(AnalysisStatusResponse::Pending)),
        JobStatus::Done(raw) => {
            let report = AnalysisReport::from_result(&raw, None).map_err(analysis_err)?;
            Ok(Json(AnalysisStatusResponse::Done { report }))
        }
        JobStatus::Failed(message) => Err(AppError::internal(message)),
    }
}
