use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

impl HealthResponse {
    pub fn healthy(model_loaded: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            model_loaded,
        }
    }
}
