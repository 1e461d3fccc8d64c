mod analysis;
mod config;
mod errors;
mod extract;
mod llm_client;
mod routes;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::ResumeAnalyzer;
use crate::config::Config;
use crate::extract::PdfTextExtractor;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::DiskUploadStorage;

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

    info!("Starting ResumeSpark API v{}", env!("CARGO_PKG_VERSION"));

    // Temporary upload storage
    let storage = DiskUploadStorage::init(&config.upload_dir).await?;
    info!("Upload directory: {}", storage.dir().display());

    // Initialize LLM client
    let llm = GeminiClient::new(config.gemini());
    info!("LLM client initialized (model: {})", llm.model());

    let analyzer = ResumeAnalyzer::new(
        config.analyzer(),
        Arc::new(storage),
        Arc::new(PdfTextExtractor),
        Arc::new(llm),
    );

    let state = AppState {
        analyzer: Arc::new(analyzer),
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
