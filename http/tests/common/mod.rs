use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use ingest_application::{
    ApplicationError, EmbeddingUseCase, ExtractTranscriptRequest, ExtractTranscriptResponse,
    GenerateEmbeddingsRequest, GenerateEmbeddingsResponse, TranscriptUseCase, NO_TEXTS_PROVIDED,
};
use ingest_domain::{DomainError, Transcript, TranscriptSegment, EMBEDDING_DIMENSION};
use ingest_http_server::{build_router, AppState};

pub const TEST_BODY_LIMIT: usize = 1024 * 1024;

/// Answers by video id: `abc123` succeeds, `disabled` is a terminal failure,
/// `explode` is an unexpected error.
pub struct StubTranscriptUseCase;

#[async_trait]
impl TranscriptUseCase for StubTranscriptUseCase {
    async fn extract(
        &self,
        request: ExtractTranscriptRequest,
    ) -> Result<ExtractTranscriptResponse, ApplicationError> {
        match request.video_id.as_str() {
            "abc123" => Ok(ExtractTranscriptResponse::succeeded(Transcript {
                language: "en".to_string(),
                segments: vec![
                    TranscriptSegment {
                        text: "Hello world".to_string(),
                        start: 0.0,
                        duration: 1.2,
                    },
                    TranscriptSegment {
                        text: "Second line".to_string(),
                        start: 1.2,
                        duration: 2.0,
                    },
                ],
            })),
            "disabled" => Ok(ExtractTranscriptResponse::failed(
                "Transcripts are disabled for this video.",
            )),
            _ => Err(ApplicationError::Internal("caption source crashed".to_string())),
        }
    }
}

pub struct StubEmbeddingUseCase {
    pub loaded: AtomicBool,
    pub calls: AtomicUsize,
    pub fail_with: Option<DomainError>,
}

impl StubEmbeddingUseCase {
    pub fn ready() -> Self {
        Self {
            loaded: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    pub fn failing(error: DomainError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::ready()
        }
    }
}

#[async_trait]
impl EmbeddingUseCase for StubEmbeddingUseCase {
    async fn generate(
        &self,
        request: GenerateEmbeddingsRequest,
    ) -> Result<GenerateEmbeddingsResponse, ApplicationError> {
        if request.texts.is_empty() {
            return Ok(GenerateEmbeddingsResponse::failed(
                NO_TEXTS_PROVIDED,
                EMBEDDING_DIMENSION,
            ));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.fail_with {
            return Err(error.clone().into());
        }
        let embeddings = request
            .texts
            .iter()
            .map(|text| vec![text.len() as f32; EMBEDDING_DIMENSION])
            .collect();
        Ok(GenerateEmbeddingsResponse::succeeded(
            embeddings,
            EMBEDDING_DIMENSION,
        ))
    }

    fn model_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

pub fn router_with(embedding: Arc<StubEmbeddingUseCase>) -> Router {
    let state = AppState::new(Arc::new(StubTranscriptUseCase), embedding);
    build_router(state, TEST_BODY_LIMIT)
}

pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> Result<(StatusCode, Value), Box<dyn std::error::Error>> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}
