use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Width of every vector produced by the all-MiniLM-L6-v2 model family.
pub const EMBEDDING_DIMENSION: usize = 384;

pub const DEFAULT_TRANSCRIPT_LANGUAGE: &str = "en";

pub type Embedding = Vec<f32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub language: String,
    pub segments: Vec<TranscriptSegment>,
}

/// A caption record as handed over by the captioning source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCaptionSegment {
    Snippet {
        text: String,
        start: f64,
        duration: f64,
    },
    Record(Map<String, Value>),
    Unrecognized,
}

impl RawCaptionSegment {
    pub fn snippet(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self::Snippet {
            text: text.into(),
            start,
            duration,
        }
    }
}

impl From<Value> for RawCaptionSegment {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Record(map),
            _ => Self::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub language_code: String,
    pub language: String,
    pub is_generated: bool,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedCaptions {
    pub language_code: String,
    pub segments: Vec<RawCaptionSegment>,
}
