use std::sync::Arc;

use sqlx::PgPool;

use crate::github::GithubClient;
use crate::oracle::scorer::CandidateScorer;

/// Shared application state injected into all route handlers via Axum
/// extractors. Clients are constructed once at startup and passed in here;
/// nothing in the pipeline reaches for ambient singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub github: GithubClient,
    /// Pluggable scorer seam. Production: `OracleScorer`.
    pub scorer: Arc<dyn CandidateScorer>,
}
