use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::store;
use crate::models::job::{JobRow, NewJobRequest};
use crate::sourcing::pipeline::{
    fetch_candidates_for_job, rank_candidates_for_job, stored_ranking, CandidatesResponse,
    RankingResponse,
};
use crate::state::AppState;

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<NewJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    request.validate().map_err(AppError::Validation)?;
    let job = store::insert_job(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    Ok(Json(store::list_jobs(&state.db).await?))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let job = store::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/:id/candidates
pub async fn handle_fetch_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<CandidatesResponse>, AppError> {
    let response = fetch_candidates_for_job(&state.db, &state.github, job_id).await?;
    Ok(Json(response))
}

/// POST /api/v1/jobs/:id/rank
pub async fn handle_rank_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<RankingResponse>, AppError> {
    let response = rank_candidates_for_job(&state.db, state.scorer.as_ref(), job_id).await?;
    Ok(Json(response))
}

/// GET /api/v1/jobs/:id/ranking
pub async fn handle_get_ranking(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<RankingResponse>, AppError> {
    let response = stored_ranking(&state.db, job_id).await?;
    Ok(Json(response))
}
