//! Stepcoach - a five-stage goal coaching service
//!
//! Walks a user through goal setting, problem identification, diagnosis,
//! planning and execution, one LLM-backed conversation turn at a time.

mod api;
mod config;
mod db;
mod extract;
mod history;
mod llm;
mod markers;
mod prompts;
mod runtime;
mod sentiment;
mod state_machine;
mod summary;

use api::{create_router, AppState, SharedCoach};
use config::Config;
use db::Database;
use llm::ModelRegistry;
use runtime::{Coach, DatabaseStorage, PromptedStageHandler, SessionStore, StageHandler};
use sentiment::SentimentScorer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PURGE_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepcoach=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening session database");
    let db = Database::open(&config.db_path, config.session_ttl)?;
    db.purge_expired()?;
    spawn_purge_task(db.clone());

    // Initialize LLM registry
    let registry = ModelRegistry::new(&config.llm);
    if registry.has_models() {
        tracing::info!(
            model = registry.coach_model_id().unwrap_or_default(),
            sentiment = registry.sentiment().is_some(),
            "LLM registry initialized"
        );
    } else {
        tracing::warn!("No LLM API key configured. Set ANTHROPIC_API_KEY.");
    }

    // Assemble the coach
    let store: Arc<dyn SessionStore> = Arc::new(DatabaseStorage::new(db));
    let handler: Arc<dyn StageHandler> = Arc::new(PromptedStageHandler::new(
        registry.coach(),
        config.retry.clone(),
    ));
    let coach: SharedCoach = Coach::new(
        store,
        handler,
        SentimentScorer::new(registry.sentiment(), config.retry.clone()),
        config.coach_context(),
    );
    let state = AppState::new(coach, registry.coach_model_id().map(str::to_string));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(CompressionLayer::new().gzip(true))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Stepcoach server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop sessions past their TTL
fn spawn_purge_task(db: Database) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = db.purge_expired() {
                tracing::warn!(error = %e, "Session purge failed");
            }
        }
    });
}
