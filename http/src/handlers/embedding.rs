use axum::{extract::State, http::StatusCode, response::Json};

use ingest_application::{GenerateEmbeddingsRequest, GenerateEmbeddingsResponse};

use crate::{
    error::{error_mapper, HttpError},
    AppState, ValidatedJson,
};

pub async fn generate_embeddings(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<GenerateEmbeddingsRequest>,
) -> Result<(StatusCode, Json<GenerateEmbeddingsResponse>), HttpError> {
    tracing::info!(
        text_count = request.texts.len(),
        "received generate-embeddings request"
    );

    match state.embedding.generate(request).await {
        Ok(response) => {
            tracing::info!(
                success = response.success,
                embedding_count = response.embeddings.len(),
                dimensions = response.dimensions,
                "generate-embeddings request completed"
            );
            Ok((StatusCode::OK, Json(response)))
        }
        Err(error) => {
            tracing::error!(error = %error, "generate-embeddings request failed");
            Err(error_mapper(error))
        }
    }
}
