use std::{path::PathBuf, sync::Arc};

use anyhow::Error;

use ingest_application::{
    EmbeddingModelRegistry, EmbeddingPipeline, EmbeddingUseCase, EmbeddingUseCaseImpl,
    RetrievalPolicy, TokioSleeper, TranscriptRetrievalEngine, TranscriptUseCase,
    TranscriptUseCaseImpl,
};
use ingest_configuration::{AppConfig, ServerConfig};
use ingest_domain::{CaptionSourcePort, EncoderLoaderPort, EMBEDDING_DIMENSION};
use ingest_http_server::{create_app_routes, AppState};
use ingest_infra_embedding::{BertEncoderConfig, CandleEncoderLoader, DeviceChoice};
use ingest_infra_youtube::{YoutubeCaptionSource, YoutubeClientConfig};

pub async fn build_and_run(config: AppConfig, server_config: ServerConfig) -> Result<(), Error> {
    let app = Application::new(config).await?;
    app.run(server_config).await
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
    pub registry: Arc<EmbeddingModelRegistry>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self, Error> {
        #[cfg(feature = "cuda")]
        tracing::info!("embedding backend: CUDA build");
        #[cfg(not(feature = "cuda"))]
        tracing::info!("embedding backend: CPU build");

        let transcript = &config.service.transcript;
        let caption_source: Arc<dyn CaptionSourcePort> = Arc::new(
            YoutubeCaptionSource::new(YoutubeClientConfig {
                request_timeout: transcript.request_timeout(),
                accept_language: transcript.accept_language.clone(),
            })
            .map_err(|err| anyhow::anyhow!("caption source setup failed: {err}"))?,
        );

        let embedding = &config.service.embedding;
        let device: DeviceChoice = embedding
            .device
            .parse()
            .map_err(|err| anyhow::anyhow!("invalid embedding configuration: {err}"))?;
        let loader: Arc<dyn EncoderLoaderPort> =
            Arc::new(CandleEncoderLoader::new(BertEncoderConfig {
                model_name: embedding.model.clone(),
                model_dir: PathBuf::from(&embedding.model_dir),
                device,
                max_sequence_length: embedding.max_sequence_length,
            }));

        Self::from_ports(config, caption_source, loader).await
    }

    /// Wire engine, pipeline and use cases over the given adapters. With `preload`
    /// the model is loaded here and a failed load aborts startup.
    pub async fn from_ports(
        config: AppConfig,
        caption_source: Arc<dyn CaptionSourcePort>,
        loader: Arc<dyn EncoderLoaderPort>,
    ) -> Result<Self, Error> {
        let transcript = &config.service.transcript;
        let embedding = &config.service.embedding;
        tracing::info!(
            max_attempts = transcript.max_attempts,
            backoff_step_secs = transcript.backoff_step_secs,
            preferred_languages = ?transcript.preferred_languages,
            model = %embedding.model,
            device = %embedding.device,
            batch_size = embedding.batch_size,
            preload = embedding.preload,
            "initializing ingest application"
        );

        let policy = RetrievalPolicy {
            max_attempts: transcript.max_attempts,
            backoff_step: transcript.backoff_step(),
            preferred_languages: transcript.preferred_languages.clone(),
        };
        let engine = Arc::new(TranscriptRetrievalEngine::new(
            caption_source,
            Arc::new(TokioSleeper),
            policy,
        ));
        let transcript_usecase: Arc<dyn TranscriptUseCase> =
            Arc::new(TranscriptUseCaseImpl::new(engine));

        let registry = Arc::new(EmbeddingModelRegistry::new(loader, EMBEDDING_DIMENSION));
        if embedding.preload {
            registry
                .ensure_loaded()
                .await
                .map_err(|err| anyhow::anyhow!("embedding model loading failed: {err}"))?;
        }

        let pipeline = Arc::new(EmbeddingPipeline::new(Arc::clone(&registry)));
        let embedding_usecase: Arc<dyn EmbeddingUseCase> = Arc::new(EmbeddingUseCaseImpl::new(
            pipeline,
            embedding.batch_size,
            !embedding.preload,
        ));

        let state = AppState::new(transcript_usecase, embedding_usecase);
        Ok(Self {
            config,
            state,
            registry,
        })
    }

    pub async fn run(self, server_config: ServerConfig) -> Result<(), Error> {
        tracing::info!(
            host = %server_config.host,
            port = server_config.port,
            model_loaded = self.registry.is_loaded(),
            "starting ingest HTTP routes"
        );

        create_app_routes(self.state, server_config)
            .await
            .map_err(|err| anyhow::anyhow!("server startup failed: {err}"))
    }
}
