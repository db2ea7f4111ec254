pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::jobs::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/jobs",
            post(handlers::handle_create_job).get(handlers::handle_list_jobs),
        )
        .route("/api/v1/jobs/:id", get(handlers::handle_get_job))
        .route(
            "/api/v1/jobs/:id/candidates",
            post(handlers::handle_fetch_candidates),
        )
        .route(
            "/api/v1/jobs/:id/rank",
            post(handlers::handle_rank_candidates),
        )
        .route(
            "/api/v1/jobs/:id/ranking",
            get(handlers::handle_get_ranking),
        )
        .with_state(state)
}
