mod config;
mod db;
mod errors;
mod github;
mod jobs;
mod models;
mod oracle;
mod routes;
mod sourcing;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::github::GithubClient;
use crate::oracle::scorer::OracleScorer;
use crate::oracle::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scout API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and bootstrap the schema
    let pool = create_pool(&config.database_url).await?;
    init_schema(&pool).await?;

    // Initialize the directory client
    let github = GithubClient::new(config.github_token.clone())?;
    info!(
        "Directory client initialized (authenticated: {})",
        config.github_token.is_some()
    );

    // Initialize the scoring oracle
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    let scorer = Arc::new(OracleScorer::new(llm));
    info!("Oracle client initialized (model: {})", oracle::MODEL);

    // Build app state
    let state = AppState {
        db: pool,
        github,
        scorer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
