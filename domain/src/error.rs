use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{service} error: {message}")]
    ExternalService { service: String, message: String },

    #[error("Model not loaded: {0}")]
    ModelNotReady(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_input(message: &str) -> Self {
        Self::InvalidInput(message.to_string())
    }

    pub fn external_service_error(service: &str, message: &str) -> Self {
        Self::ExternalService {
            service: service.to_string(),
            message: message.to_string(),
        }
    }

    pub fn model_not_ready(message: &str) -> Self {
        Self::ModelNotReady(message.to_string())
    }

    pub fn internal_error(message: &str) -> Self {
        Self::Internal(message.to_string())
    }
}

/// Failures reported by a captioning source.
///
/// The rendered messages keep the wording the retrieval engine classifies on
/// ("transcripts are disabled", "video unavailable"); a structured signal from the
/// source would be preferable once one exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptionSourceError {
    #[error("Transcripts are disabled for this video ({video_id})")]
    TranscriptsDisabled { video_id: String },

    #[error("Video unavailable: {video_id} ({reason})")]
    VideoUnavailable { video_id: String, reason: String },

    #[error("No transcript found for {video_id} in languages [{requested}]")]
    NoTranscriptFound { video_id: String, requested: String },

    #[error("Requests to the captioning source are being blocked ({0})")]
    RequestBlocked(String),

    #[error("Captioning source request failed: {0}")]
    Http(String),

    #[error("Could not parse captioning source response: {0}")]
    Parse(String),
}
