//! Cache-first Orchestrator — the per-job state machine driving the
//! pipeline.
//!
//! States: `new → fetched → ranked`, with a transient `ranking` claim held
//! while one request runs the scoring pass. Fetching and ranking are
//! idempotent: once a phase has produced a stored answer, repeat requests
//! serve it from the store and never recompute.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::github::{fetcher, GithubClient};
use crate::jobs::store;
use crate::models::candidate::CandidateRow;
use crate::models::job::{JobRow, JobStatus};
use crate::oracle::scorer::CandidateScorer;
use crate::sourcing::reconcile::{reconcile, RankedCandidate};

/// Whether a response was served from the store or freshly computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cached,
    Fresh,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub job_id: Uuid,
    pub source: Source,
    pub total_candidates: usize,
    pub candidates: Vec<CandidateRow>,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub job_id: Uuid,
    pub source: Source,
    pub summary: Option<String>,
    pub total_candidates: usize,
    pub candidates: Vec<CandidateRow>,
}

/// Fetch phase. On a `new` job this queries the directory and persists the
/// profile set; on any later state it returns the stored set untouched.
///
/// An empty directory result does NOT advance the state machine; the job
/// stays fetchable, since there is nothing stored worth caching.
pub async fn fetch_candidates_for_job(
    pool: &PgPool,
    github: &GithubClient,
    job_id: Uuid,
) -> Result<CandidatesResponse, AppError> {
    let job = require_job(pool, job_id).await?;

    if job.state() != JobStatus::New {
        let candidates = store::candidates_in_fetch_order(pool, job.id).await?;
        return Ok(CandidatesResponse {
            job_id: job.id,
            source: Source::Cached,
            total_candidates: candidates.len(),
            candidates,
        });
    }

    let limit = job.desired_candidates.max(1) as usize;
    let profiles = fetcher::fetch_candidates(github, &job, limit)
        .await
        .map_err(|e| AppError::Directory(e.to_string()))?;

    if profiles.is_empty() {
        warn!("no candidates found for job {}", job.id);
        return Ok(CandidatesResponse {
            job_id: job.id,
            source: Source::Fresh,
            total_candidates: 0,
            candidates: Vec::new(),
        });
    }

    store::upsert_profiles(pool, job.id, &profiles, Utc::now()).await?;
    if !store::transition(pool, job.id, JobStatus::New, JobStatus::Fetched).await? {
        // Lost a fetch race; the other writer's set is equivalent.
        info!("job {} was fetched concurrently, serving stored set", job.id);
    }

    let candidates = store::candidates_in_fetch_order(pool, job.id).await?;
    info!(
        "fetched and stored {} candidates for job {}",
        candidates.len(),
        job.id
    );
    Ok(CandidatesResponse {
        job_id: job.id,
        source: Source::Fresh,
        total_candidates: candidates.len(),
        candidates,
    })
}

/// Rank phase. Serves the stored ranking once one exists; otherwise claims
/// the job, runs the scoring pipeline over the stored profile set, and
/// persists the result.
pub async fn rank_candidates_for_job(
    pool: &PgPool,
    scorer: &dyn CandidateScorer,
    job_id: Uuid,
) -> Result<RankingResponse, AppError> {
    let job = require_job(pool, job_id).await?;

    match job.state() {
        JobStatus::Ranked => return stored_ranking_response(pool, &job).await,
        JobStatus::Ranking => {
            return Err(AppError::Conflict(
                "ranking is already in progress for this job".to_string(),
            ))
        }
        JobStatus::New => {
            return Err(AppError::UnprocessableEntity(
                "no candidates have been fetched for this job".to_string(),
            ))
        }
        JobStatus::Fetched => {}
    }

    let rows = store::candidates_in_fetch_order(pool, job.id).await?;
    if rows.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "no candidates stored for this job".to_string(),
        ));
    }

    // Claim the job before the expensive oracle work. Exactly one of any
    // set of concurrent requests wins; the rest get a conflict.
    if !store::transition(pool, job.id, JobStatus::Fetched, JobStatus::Ranking).await? {
        let current = require_job(pool, job_id).await?;
        if current.state() == JobStatus::Ranked {
            return stored_ranking_response(pool, &current).await;
        }
        return Err(AppError::Conflict(
            "ranking is already in progress for this job".to_string(),
        ));
    }

    let profiles: Vec<_> = rows.iter().map(CandidateRow::profile).collect();
    let scores = scorer.score(&job, &profiles).await;
    let ranked_at = Utc::now();
    let ranked = reconcile(profiles, scores, ranked_at);
    let summary = format!(
        "Ranked {} candidates for '{}' by GitHub evidence against the required skills.",
        ranked.len(),
        job.title
    );

    // Availability over durability: a persistence failure is logged and the
    // freshly computed ranking is still returned to the caller.
    let persisted = persist(pool, &job, &ranked, &summary, ranked_at).await;
    if !persisted {
        release_claim(pool, job.id).await;
    }

    info!(
        "ranked {} candidates for job {} (persisted: {persisted})",
        ranked.len(),
        job.id
    );
    Ok(RankingResponse {
        job_id: job.id,
        source: Source::Fresh,
        summary: Some(summary),
        total_candidates: ranked.len(),
        candidates: ranked.iter().map(|c| c.to_row(job.id)).collect(),
    })
}

/// Read path for a stored ranking. 404 until the job has been ranked.
pub async fn stored_ranking(pool: &PgPool, job_id: Uuid) -> Result<RankingResponse, AppError> {
    let job = require_job(pool, job_id).await?;
    if job.state() != JobStatus::Ranked {
        return Err(AppError::NotFound(format!(
            "no ranking stored for job {job_id}"
        )));
    }
    stored_ranking_response(pool, &job).await
}

async fn require_job(pool: &PgPool, job_id: Uuid) -> Result<JobRow, AppError> {
    store::get_job(pool, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

async fn stored_ranking_response(
    pool: &PgPool,
    job: &JobRow,
) -> Result<RankingResponse, AppError> {
    let candidates = store::candidates_by_score(pool, job.id).await?;
    Ok(RankingResponse {
        job_id: job.id,
        source: Source::Cached,
        summary: job.summary.clone(),
        total_candidates: candidates.len(),
        candidates,
    })
}

async fn persist(
    pool: &PgPool,
    job: &JobRow,
    ranked: &[RankedCandidate],
    summary: &str,
    ranked_at: chrono::DateTime<Utc>,
) -> bool {
    if let Err(e) = store::persist_ranking(pool, job.id, ranked).await {
        error!("failed to persist ranking for job {}: {e}", job.id);
        return false;
    }
    match store::mark_ranked(pool, job.id, summary, ranked_at).await {
        Ok(true) => true,
        Ok(false) => {
            warn!("job {} left the ranking state mid-run", job.id);
            false
        }
        Err(e) => {
            error!("failed to finalize ranking for job {}: {e}", job.id);
            false
        }
    }
}

/// Best-effort release of the ranking claim after a failed persist, so the
/// job can be ranked again instead of wedging in `ranking`.
async fn release_claim(pool: &PgPool, job_id: Uuid) {
    match store::transition(pool, job_id, JobStatus::Ranking, JobStatus::Fetched).await {
        Ok(true) => {}
        Ok(false) => warn!("could not release ranking claim for job {job_id}"),
        Err(e) => error!("failed to release ranking claim for job {job_id}: {e}"),
    }
}
