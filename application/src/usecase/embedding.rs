use std::sync::Arc;

use async_trait::async_trait;

use ingest_domain::DomainError;

use crate::{
    ApplicationError, EmbeddingPipeline, GenerateEmbeddingsRequest, GenerateEmbeddingsResponse,
    NO_TEXTS_PROVIDED,
};

#[async_trait]
pub trait EmbeddingUseCase: Send + Sync {
    async fn generate(
        &self,
        request: GenerateEmbeddingsRequest,
    ) -> Result<GenerateEmbeddingsResponse, ApplicationError>;

    /// Readiness check; never triggers a model load.
    fn model_loaded(&self) -> bool;
}

pub struct EmbeddingUseCaseImpl {
    pipeline: Arc<EmbeddingPipeline>,
    batch_size: usize,
    load_on_demand: bool,
}

impl EmbeddingUseCaseImpl {
    pub fn new(pipeline: Arc<EmbeddingPipeline>, batch_size: usize, load_on_demand: bool) -> Self {
        Self {
            pipeline,
            batch_size,
            load_on_demand,
        }
    }
}

#[async_trait]
impl EmbeddingUseCase for EmbeddingUseCaseImpl {
    async fn generate(
        &self,
        request: GenerateEmbeddingsRequest,
    ) -> Result<GenerateEmbeddingsResponse, ApplicationError> {
        let dimensions = self.pipeline.dimension();
        if request.texts.is_empty() {
            return Ok(GenerateEmbeddingsResponse::failed(
                NO_TEXTS_PROVIDED,
                dimensions,
            ));
        }

        tracing::debug!(
            text_count = request.texts.len(),
            batch_size = self.batch_size,
            "generating embeddings"
        );

        if self.load_on_demand {
            self.pipeline.registry().ensure_loaded().await?;
        }

        match self.pipeline.generate(&request.texts, self.batch_size).await {
            Ok(embeddings) => Ok(GenerateEmbeddingsResponse::succeeded(embeddings, dimensions)),
            Err(DomainError::ModelNotReady(message)) => {
                tracing::warn!(%message, "embedding requested before the model was loaded");
                Ok(GenerateEmbeddingsResponse::failed(
                    format!("Model not loaded: {message}"),
                    dimensions,
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn model_loaded(&self) -> bool {
        self.pipeline.registry().is_loaded()
    }
}
