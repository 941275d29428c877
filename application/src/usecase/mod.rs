mod embedding;
mod transcript;

pub use embedding::{EmbeddingUseCase, EmbeddingUseCaseImpl};
pub use transcript::{TranscriptUseCase, TranscriptUseCaseImpl};
