use serde::{Deserialize, Serialize};
use validator::Validate;

use ingest_domain::{Transcript, TranscriptSegment, DEFAULT_TRANSCRIPT_LANGUAGE};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExtractTranscriptRequest {
    #[validate(length(min = 1))]
    pub video_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractTranscriptResponse {
    pub success: bool,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl ExtractTranscriptResponse {
    pub fn succeeded(transcript: Transcript) -> Self {
        Self {
            success: true,
            segments: transcript.segments,
            error: None,
            language: transcript.language,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            segments: Vec::new(),
            error: Some(error.into()),
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    DEFAULT_TRANSCRIPT_LANGUAGE.to_string()
}
