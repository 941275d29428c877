mod embedding;
mod health;
mod transcript;

pub use embedding::generate_embeddings;
pub use health::health_check;
pub use transcript::extract_transcript;
