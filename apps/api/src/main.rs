mod config;
mod criteria;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod routes;
mod sheets;
mod state;
mod store;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::criteria::LlmCriteriaGenerator;
use crate::jobs::factory::JobFactory;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::sheets::candidates::CandidateRowWriter;
use crate::sheets::google::GoogleSheetsClient;
use crate::sheets::provisioner::SheetProvisioner;
use crate::state::AppState;
use crate::store::JobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Analyser API v{}", env!("CARGO_PKG_VERSION"));

    // Job store (JSON document on disk)
    let store = Arc::new(JobStore::new(&config.store_path));
    info!("Job store at {}", store.path().display());

    // LLM client and criteria generation
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let criteria = Arc::new(LlmCriteriaGenerator::new(llm));

    // Google Sheets / Drive
    let sheets = Arc::new(GoogleSheetsClient::from_key_file(
        &config.google_credentials_path,
        config.google_delegated_user.clone(),
    )?);
    match &config.google_delegated_user {
        Some(user) => info!("Google client initialized (delegating to {user})"),
        None => info!("Google client initialized (service account only)"),
    }

    let provisioner = SheetProvisioner::new(sheets.clone(), config.google_delegated_user.is_some());
    let factory = JobFactory::new(
        criteria,
        provisioner,
        store.clone(),
        config.sheet_share_email.clone(),
    );

    // Build app state
    let state = AppState {
        store,
        factory: Arc::new(factory),
        candidates: Arc::new(CandidateRowWriter::new(sheets)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the recruiter UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
