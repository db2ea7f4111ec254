//! Store queries for jobs and candidates.
//!
//! Candidate writes are keyed upserts on (job_id, username): re-running a
//! pipeline phase overwrites rows, never duplicates them, and each record
//! write is atomic on its own.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::candidate::{CandidateProfile, CandidateRow};
use crate::models::job::{JobRow, JobStatus, NewJobRequest};
use crate::sourcing::reconcile::RankedCandidate;

pub async fn insert_job(pool: &PgPool, request: &NewJobRequest) -> sqlx::Result<JobRow> {
    sqlx::query_as(
        r#"
        INSERT INTO jobs
            (id, title, description, required_skills, location, desired_candidates,
             company_name, salary, employment_type, experience_required)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.title)
    .bind(&request.description)
    .bind(&request.required_skills)
    .bind(&request.location)
    .bind(request.desired_candidates)
    .bind(&request.company_name)
    .bind(&request.salary)
    .bind(&request.employment_type)
    .bind(&request.experience_required)
    .fetch_one(pool)
    .await
}

pub async fn get_job(pool: &PgPool, job_id: Uuid) -> sqlx::Result<Option<JobRow>> {
    sqlx::query_as("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_jobs(pool: &PgPool) -> sqlx::Result<Vec<JobRow>> {
    sqlx::query_as("SELECT * FROM jobs ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Conditional state transition; returns whether this caller won the write.
/// This is the claim primitive that keeps two concurrent rank requests from
/// both recomputing.
pub async fn transition(
    pool: &PgPool,
    job_id: Uuid,
    from: JobStatus,
    to: JobStatus,
) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE jobs SET status = $3 WHERE id = $1 AND status = $2")
        .bind(job_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Final transition out of the ranking claim, recording the summary.
pub async fn mark_ranked(
    pool: &PgPool,
    job_id: Uuid,
    summary: &str,
    ranked_at: DateTime<Utc>,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE jobs SET status = 'ranked', summary = $2, ranked_at = $3
         WHERE id = $1 AND status = 'ranking'",
    )
    .bind(job_id)
    .bind(summary)
    .bind(ranked_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Stored candidates in original fetch order — the pipeline's input order.
pub async fn candidates_in_fetch_order(
    pool: &PgPool,
    job_id: Uuid,
) -> sqlx::Result<Vec<CandidateRow>> {
    sqlx::query_as("SELECT * FROM candidates WHERE job_id = $1 ORDER BY position")
        .bind(job_id)
        .fetch_all(pool)
        .await
}

/// Stored candidates best first. Equal scores fall back to fetch order,
/// matching the ranking's tie-break.
pub async fn candidates_by_score(pool: &PgPool, job_id: Uuid) -> sqlx::Result<Vec<CandidateRow>> {
    sqlx::query_as("SELECT * FROM candidates WHERE job_id = $1 ORDER BY score DESC, position")
        .bind(job_id)
        .fetch_all(pool)
        .await
}

/// Upserts freshly fetched profiles. Only profile data and fetch order are
/// written; scoring columns keep their defaults or previous values.
pub async fn upsert_profiles(
    pool: &PgPool,
    job_id: Uuid,
    profiles: &[CandidateProfile],
    retrieved_at: DateTime<Utc>,
) -> sqlx::Result<()> {
    for (position, profile) in profiles.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO candidates
                (job_id, username, display_name, email, bio, company, location,
                 profile_url, avatar_url, followers, public_repos, repositories,
                 position, retrieved_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (job_id, username) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                email = EXCLUDED.email,
                bio = EXCLUDED.bio,
                company = EXCLUDED.company,
                location = EXCLUDED.location,
                profile_url = EXCLUDED.profile_url,
                avatar_url = EXCLUDED.avatar_url,
                followers = EXCLUDED.followers,
                public_repos = EXCLUDED.public_repos,
                repositories = EXCLUDED.repositories,
                position = EXCLUDED.position,
                retrieved_at = EXCLUDED.retrieved_at
            "#,
        )
        .bind(job_id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.email)
        .bind(&profile.bio)
        .bind(&profile.company)
        .bind(&profile.location)
        .bind(&profile.profile_url)
        .bind(&profile.avatar_url)
        .bind(profile.followers)
        .bind(profile.public_repos)
        .bind(serde_json::to_value(&profile.repositories).unwrap_or_default())
        .bind(position as i32)
        .bind(retrieved_at)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Upserts the full ranked rows, scoring columns included.
pub async fn persist_ranking(
    pool: &PgPool,
    job_id: Uuid,
    ranked: &[RankedCandidate],
) -> sqlx::Result<()> {
    for candidate in ranked {
        let row = candidate.to_row(job_id);
        sqlx::query(
            r#"
            INSERT INTO candidates
                (job_id, username, display_name, email, bio, company, location,
                 profile_url, avatar_url, followers, public_repos, repositories,
                 position, matched_skills, score, experience, rationale, rank,
                 retrieved_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19)
            ON CONFLICT (job_id, username) DO UPDATE SET
                matched_skills = EXCLUDED.matched_skills,
                score = EXCLUDED.score,
                experience = EXCLUDED.experience,
                rationale = EXCLUDED.rationale,
                rank = EXCLUDED.rank,
                retrieved_at = EXCLUDED.retrieved_at
            "#,
        )
        .bind(row.job_id)
        .bind(&row.username)
        .bind(&row.display_name)
        .bind(&row.email)
        .bind(&row.bio)
        .bind(&row.company)
        .bind(&row.location)
        .bind(&row.profile_url)
        .bind(&row.avatar_url)
        .bind(row.followers)
        .bind(row.public_repos)
        .bind(&row.repositories)
        .bind(row.position)
        .bind(&row.matched_skills)
        .bind(row.score)
        .bind(&row.experience)
        .bind(&row.rationale)
        .bind(row.rank)
        .bind(row.retrieved_at)
        .execute(pool)
        .await?;
    }
    Ok(())
}
