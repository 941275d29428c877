use axum::{extract::State, response::Json};

use ingest_application::HealthResponse;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.embedding.model_loaded()))
}
