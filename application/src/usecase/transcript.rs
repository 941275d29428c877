use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    ApplicationError, ExtractTranscriptRequest, ExtractTranscriptResponse,
    TranscriptRetrievalEngine,
};

#[async_trait]
pub trait TranscriptUseCase: Send + Sync {
    async fn extract(
        &self,
        request: ExtractTranscriptRequest,
    ) -> Result<ExtractTranscriptResponse, ApplicationError>;
}

pub struct TranscriptUseCaseImpl {
    engine: Arc<TranscriptRetrievalEngine>,
}

impl TranscriptUseCaseImpl {
    pub fn new(engine: Arc<TranscriptRetrievalEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl TranscriptUseCase for TranscriptUseCaseImpl {
    async fn extract(
        &self,
        request: ExtractTranscriptRequest,
    ) -> Result<ExtractTranscriptResponse, ApplicationError> {
        let video_id = request.video_id.as_str();
        match self.engine.fetch(video_id).await {
            Ok(transcript) => Ok(ExtractTranscriptResponse::succeeded(transcript)),
            Err(failure) => {
                tracing::warn!(video_id, error = %failure, "transcript extraction failed");
                Ok(ExtractTranscriptResponse::failed(failure.to_string()))
            }
        }
    }
}
