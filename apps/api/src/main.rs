mod config;
mod db;
mod errors;
mod identity;
mod llm_client;
mod models;
mod plans;
mod questionnaire;
mod rate_limit;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, RateLimitBackend};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::plans::generator::LlmPlanGenerator;
use crate::plans::inflight::InFlight;
use crate::plans::store::PgPlanStore;
use crate::questionnaire::drafts::RedisDraftStore;
use crate::questionnaire::navigation::QuestionGraph;
use crate::rate_limit::{InMemoryQuota, RedisQuota, RequestQuota};
use crate::routes::build_router;
use crate::state::AppState;

/// How often expired in-memory quota windows are swept.
const QUOTA_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Compliance API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let policy = config.quota_policy();
    let quota: Arc<dyn RequestQuota> = match config.rate_limit_backend {
        RateLimitBackend::Redis => Arc::new(RedisQuota::new(redis.clone(), policy)),
        RateLimitBackend::Memory => {
            let quota = Arc::new(InMemoryQuota::new(policy));
            let sweeper = Arc::clone(&quota);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(QUOTA_CLEANUP_INTERVAL);
                loop {
                    interval.tick().await;
                    sweeper.cleanup().await;
                }
            });
            quota
        }
    };
    info!(
        "Plan quota: {} per {}s ({:?} backend)",
        policy.limit,
        policy.window.as_secs(),
        config.rate_limit_backend
    );

    // Build app state
    let state = AppState {
        graph: QuestionGraph::canonical(),
        plans: Arc::new(PgPlanStore::new(db)),
        generator: Arc::new(LlmPlanGenerator::new(llm)),
        quota,
        drafts: Arc::new(RedisDraftStore::new(redis)),
        in_flight: InFlight::default(),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the front-end host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
