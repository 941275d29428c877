use std::sync::Arc;

use async_trait::async_trait;

use ingest_domain::{DomainError, EncoderLoaderPort, TextEncoderPort};

use crate::bert::{BertEncoder, BertEncoderConfig, CandleTextEncoder};

/// Builds the candle encoder from files on disk; the load runs on the blocking pool.
pub struct CandleEncoderLoader {
    config: BertEncoderConfig,
}

impl CandleEncoderLoader {
    pub fn new(config: BertEncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BertEncoderConfig {
        &self.config
    }
}

#[async_trait]
impl EncoderLoaderPort for CandleEncoderLoader {
    fn model_name(&self) -> &str {
        &self.config.model_name
    }

    async fn load(&self) -> Result<Arc<dyn TextEncoderPort>, DomainError> {
        tracing::info!(
            model = %self.config.model_name,
            model_dir = %self.config.model_dir.display(),
            "reading embedding model files"
        );

        let config = self.config.clone();
        let encoder = tokio::task::spawn_blocking(move || BertEncoder::load(&config))
            .await
            .map_err(|err| DomainError::internal_error(&format!("model load task failed: {err}")))??;

        Ok(Arc::new(CandleTextEncoder::new(encoder)))
    }
}
