use serde::{Deserialize, Serialize};
use validator::Validate;

use ingest_domain::{Embedding, EMBEDDING_DIMENSION};

pub const NO_TEXTS_PROVIDED: &str = "No texts provided";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateEmbeddingsRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateEmbeddingsResponse {
    pub success: bool,
    #[serde(default)]
    pub embeddings: Vec<Embedding>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl GenerateEmbeddingsResponse {
    pub fn succeeded(embeddings: Vec<Embedding>, dimensions: usize) -> Self {
        Self {
            success: true,
            embeddings,
            error: None,
            dimensions,
        }
    }

    pub fn failed(error: impl Into<String>, dimensions: usize) -> Self {
        Self {
            success: false,
            embeddings: Vec::new(),
            error: Some(error.into()),
            dimensions,
        }
    }
}

fn default_dimensions() -> usize {
    EMBEDDING_DIMENSION
}
