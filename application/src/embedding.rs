use std::sync::Arc;

use tokio::sync::OnceCell;

use ingest_domain::{DomainError, Embedding, EncoderLoaderPort, TextEncoderPort};

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Above this many texts, batch progress is logged.
const PROGRESS_THRESHOLD: usize = 10;

/// Owns the single encoder instance shared by every request for the life of the process.
///
/// Construction is guarded by a [`OnceCell`]: concurrent first callers of
/// [`ensure_loaded`](Self::ensure_loaded) wait on one load and all receive the same
/// instance. A failed load leaves the cell empty so a later call can try again.
pub struct EmbeddingModelRegistry {
    loader: Arc<dyn EncoderLoaderPort>,
    dimension: usize,
    model: OnceCell<Arc<dyn TextEncoderPort>>,
}

impl EmbeddingModelRegistry {
    pub fn new(loader: Arc<dyn EncoderLoaderPort>, dimension: usize) -> Self {
        Self {
            loader,
            dimension,
            model: OnceCell::new(),
        }
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<dyn TextEncoderPort>, DomainError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                tracing::info!(model = self.loader.model_name(), "loading embedding model");
                let model = self.loader.load().await?;
                if model.dimension() != self.dimension {
                    return Err(DomainError::internal_error(&format!(
                        "model `{}` produces {} dimensions, expected {}",
                        self.loader.model_name(),
                        model.dimension(),
                        self.dimension
                    )));
                }
                tracing::info!(model = self.loader.model_name(), "embedding model loaded");
                Ok(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }

    /// The loaded encoder, without triggering a load.
    pub fn get_loaded(&self) -> Result<Arc<dyn TextEncoderPort>, DomainError> {
        self.model.get().cloned().ok_or_else(|| {
            DomainError::model_not_ready("embedding model has not finished loading")
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> &str {
        self.loader.model_name()
    }
}

pub struct EmbeddingPipeline {
    registry: Arc<EmbeddingModelRegistry>,
}

impl EmbeddingPipeline {
    pub fn new(registry: Arc<EmbeddingModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<EmbeddingModelRegistry> {
        &self.registry
    }

    pub fn dimension(&self) -> usize {
        self.registry.dimension()
    }

    /// Encode `texts` in chunks of at most `batch_size`; output order and count match the input.
    pub async fn generate(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Embedding>, DomainError> {
        let encoder = self.registry.get_loaded()?;
        let batch_size = batch_size.max(1);
        let dimension = self.registry.dimension();
        let total = texts.len();
        let report_progress = total > PROGRESS_THRESHOLD;

        let mut vectors = Vec::with_capacity(total);
        for (batch_index, chunk) in texts.chunks(batch_size).enumerate() {
            let encoded = encoder.encode(chunk.to_vec()).await?;
            if encoded.len() != chunk.len() {
                return Err(DomainError::internal_error(&format!(
                    "encoder returned {} vectors for {} texts",
                    encoded.len(),
                    chunk.len()
                )));
            }
            if let Some(vector) = encoded.iter().find(|vector| vector.len() != dimension) {
                return Err(DomainError::internal_error(&format!(
                    "encoder returned a {}-dimensional vector, expected {dimension}",
                    vector.len()
                )));
            }
            vectors.extend(encoded);

            if report_progress {
                tracing::info!(
                    batch = batch_index + 1,
                    encoded = vectors.len(),
                    total,
                    "embedding progress"
                );
            }
        }

        Ok(vectors)
    }
}
