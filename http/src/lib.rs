use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use ingest_application::{EmbeddingUseCase, TranscriptUseCase};
use ingest_configuration::ServerConfig;

pub mod error;
pub mod extract;
pub mod handlers;

pub use error::{error_mapper, HttpError};
pub use extract::ValidatedJson;
pub use handlers::*;

#[derive(Clone)]
pub struct AppState {
    pub transcript: Arc<dyn TranscriptUseCase>,
    pub embedding: Arc<dyn EmbeddingUseCase>,
}

impl AppState {
    pub fn new(
        transcript: Arc<dyn TranscriptUseCase>,
        embedding: Arc<dyn EmbeddingUseCase>,
    ) -> Self {
        Self {
            transcript,
            embedding,
        }
    }
}

pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/extract-transcript", post(extract_transcript))
        .route("/generate-embeddings", post(generate_embeddings))
        // Embedding batches can carry thousands of texts; raise the body limit.
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.host:config.port` and serve until Ctrl-C.
pub async fn create_app_routes(state: AppState, config: ServerConfig) -> anyhow::Result<()> {
    let router = build_router(state, config.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    tracing::info!(address = %listener.local_addr()?, "ingest service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("ingest service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
