mod assistant;
mod config;
mod demo;
mod errors;
mod language;
mod llm_client;
mod profile;
mod rate_limit;
mod routes;
mod state;
mod text;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{CompletionGateway, LlmClient};
use crate::profile::ProfileCatalog;
use crate::rate_limit::RateLimiter;
use crate::routes::build_router;
use crate::state::AppState;

const EVICTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(mode = ?config.app_mode, "Starting Vitae API v{}", env!("CARGO_PKG_VERSION"));

    // Profile catalog (owner data, or the bundled example)
    let profiles = ProfileCatalog::load(&config)?;

    // Completion gateway is optional: without a key the AI routes answer api_key_missing
    let gateway: Option<Arc<dyn CompletionGateway>> = match &config.groq_api_key {
        Some(key) => {
            let client = LlmClient::new(key.clone(), config.llm.clone())?;
            info!("LLM client initialized (model: {})", client.model());
            Some(Arc::new(client) as Arc<dyn CompletionGateway>)
        }
        None => {
            warn!("GROQ_API_KEY is not set; AI endpoints will answer api_key_missing");
            None
        }
    };

    let state = AppState::new(config.clone(), profiles, gateway);
    spawn_eviction(state.limiter.clone());

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically drops rate-limit windows that have already elapsed.
fn spawn_eviction(limiter: RateLimiter) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EVICTION_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.purge_expired(Instant::now());
            debug!(removed, remaining = limiter.tracked_keys(), "Purged rate-limit windows");
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
