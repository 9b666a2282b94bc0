mod config;
mod data;
mod errors;
mod routes;
mod search;
mod similarity;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::data::snapshot::DataSnapshot;
use crate::routes::build_router;
use crate::search::{HttpJobSearch, JobSearch, UnconfiguredSearch};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RoleGraph API v{}", env!("CARGO_PKG_VERSION"));

    // Load the three tables once; every request reads this snapshot
    let snapshot = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            DataSnapshot::load(&config.results_path, &config.matrix_path, &config.jobs_path)
        })
        .await
        .context("snapshot loader panicked")?
        .context("Failed to load similarity data")?
    };

    // Initialize NLP search collaborator
    let search: Arc<dyn JobSearch> = match &config.search_engine_url {
        Some(url) => {
            info!("NLP search engine: {url}");
            Arc::new(HttpJobSearch::new(url.clone(), config.search_api_key.clone())?)
        }
        None => {
            warn!("SEARCH_ENGINE_URL not set; NLP search is disabled");
            Arc::new(UnconfiguredSearch)
        }
    };

    info!("Match count policy: {:?}", config.match_count_policy);

    // Build app state
    let state = AppState {
        snapshot: Arc::new(snapshot),
        config: config.clone(),
        search,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the dashboard origin once it is deployed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
