use axum::{extract::State, http::StatusCode, response::Json};

use ingest_application::{ExtractTranscriptRequest, ExtractTranscriptResponse};

use crate::{
    error::{error_mapper, HttpError},
    AppState, ValidatedJson,
};

pub async fn extract_transcript(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ExtractTranscriptRequest>,
) -> Result<(StatusCode, Json<ExtractTranscriptResponse>), HttpError> {
    tracing::info!(video_id = %request.video_id, "received extract-transcript request");

    match state.transcript.extract(request).await {
        Ok(response) => {
            tracing::info!(
                success = response.success,
                segment_count = response.segments.len(),
                language = %response.language,
                "extract-transcript request completed"
            );
            Ok((StatusCode::OK, Json(response)))
        }
        Err(error) => {
            tracing::error!(error = %error, "extract-transcript request failed");
            Err(error_mapper(error))
        }
    }
}
