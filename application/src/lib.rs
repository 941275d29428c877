pub mod dto;
pub mod embedding;
pub mod error;
pub mod retrieval;
pub mod usecase;

pub use dto::*;
pub use embedding::{EmbeddingModelRegistry, EmbeddingPipeline, DEFAULT_BATCH_SIZE};
pub use error::*;
pub use retrieval::{
    classify_failure, BackoffSleeper, FailureClass, RetrievalPolicy, TokioSleeper,
    TranscriptFailure, TranscriptRetrievalEngine,
};
pub use usecase::{EmbeddingUseCase, EmbeddingUseCaseImpl, TranscriptUseCase, TranscriptUseCaseImpl};
