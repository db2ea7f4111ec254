use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Bootstraps the schema at startup. Every statement is idempotent, so this
/// is safe to run on every boot.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id UUID PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            required_skills TEXT[] NOT NULL,
            location TEXT,
            desired_candidates INT NOT NULL,
            company_name TEXT,
            salary TEXT,
            employment_type TEXT,
            experience_required TEXT,
            status TEXT NOT NULL DEFAULT 'new',
            summary TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            ranked_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            username TEXT NOT NULL,
            display_name TEXT,
            email TEXT,
            bio TEXT,
            company TEXT,
            location TEXT,
            profile_url TEXT NOT NULL,
            avatar_url TEXT,
            followers INT NOT NULL DEFAULT 0,
            public_repos INT NOT NULL DEFAULT 0,
            repositories JSONB NOT NULL DEFAULT '[]',
            position INT NOT NULL DEFAULT 0,
            matched_skills TEXT[] NOT NULL DEFAULT '{}',
            score INT NOT NULL DEFAULT 0,
            experience TEXT NOT NULL DEFAULT 'Not assessed',
            rationale TEXT NOT NULL DEFAULT '',
            rank INT,
            retrieved_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (job_id, username)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Secondary access path: ranked reads are served in descending-score order.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS candidates_job_score_idx
         ON candidates (job_id, score DESC)",
    )
    .execute(pool)
    .await?;

    info!("Database schema ready");
    Ok(())
}
