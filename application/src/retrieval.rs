//! Transcript retrieval with language fallback and bounded, linearly backed-off retries.
//!
//! Each call walks an explicit state machine:
//!
//! ```text
//! Attempting ──ok──────────────▶ Succeeded
//!     │ terminal failure ──────▶ TerminalFailed
//!     │ retryable, attempts left ▶ Backoff ──sleep──▶ Attempting
//!     └ retryable, none left ──▶ Exhausted
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use ingest_domain::{
    normalize_segments, CaptionSourcePort, RawCaptionSegment, Transcript,
    DEFAULT_TRANSCRIPT_LANGUAGE,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(2);

const TRANSCRIPTS_DISABLED_MESSAGE: &str = "Transcripts are disabled for this video.";
const VIDEO_UNAVAILABLE_MESSAGE: &str = "Video is unavailable.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
    pub preferred_languages: Vec<String>,
}

impl Default for RetrievalPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
            preferred_languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
        }
    }
}

impl RetrievalPolicy {
    /// Delay after the failed attempt at zero-based `attempt_index`: step, 2*step, 3*step, ...
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt_index.saturating_add(1))
    }
}

#[async_trait]
pub trait BackoffSleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl BackoffSleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptFailure {
    #[error("{0}")]
    Terminal(String),

    #[error("Failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    TranscriptsDisabled,
    VideoUnavailable,
    Retryable,
}

impl FailureClass {
    pub fn is_terminal(self) -> bool {
        !matches!(self, FailureClass::Retryable)
    }

    pub fn terminal_message(self) -> Option<&'static str> {
        match self {
            FailureClass::TranscriptsDisabled => Some(TRANSCRIPTS_DISABLED_MESSAGE),
            FailureClass::VideoUnavailable => Some(VIDEO_UNAVAILABLE_MESSAGE),
            FailureClass::Retryable => None,
        }
    }
}

/// Classify a failure by keyword. This depends on the source's message wording.
pub fn classify_failure(message: &str) -> FailureClass {
    let message = message.to_lowercase();
    if message.contains("transcripts are disabled") {
        FailureClass::TranscriptsDisabled
    } else if message.contains("video unavailable") {
        FailureClass::VideoUnavailable
    } else {
        FailureClass::Retryable
    }
}

enum AttemptState {
    Attempting { attempt: u32 },
    Backoff { attempt: u32 },
    TerminalFailed(&'static str),
    Exhausted { last_error: String },
    Succeeded(Transcript),
}

pub struct TranscriptRetrievalEngine {
    source: Arc<dyn CaptionSourcePort>,
    sleeper: Arc<dyn BackoffSleeper>,
    policy: RetrievalPolicy,
}

impl TranscriptRetrievalEngine {
    pub fn new(
        source: Arc<dyn CaptionSourcePort>,
        sleeper: Arc<dyn BackoffSleeper>,
        policy: RetrievalPolicy,
    ) -> Self {
        Self {
            source,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetrievalPolicy {
        &self.policy
    }

    pub async fn fetch(&self, video_id: &str) -> Result<Transcript, TranscriptFailure> {
        self.fetch_with_attempts(video_id, self.policy.max_attempts)
            .await
    }

    pub async fn fetch_with_attempts(
        &self,
        video_id: &str,
        max_attempts: u32,
    ) -> Result<Transcript, TranscriptFailure> {
        let max_attempts = max_attempts.max(1);
        let mut state = AttemptState::Attempting { attempt: 0 };

        loop {
            state = match state {
                AttemptState::Attempting { attempt } => {
                    tracing::info!(
                        video_id,
                        attempt = attempt + 1,
                        max_attempts,
                        "fetching transcript"
                    );
                    match self.attempt(video_id).await {
                        Ok(transcript) => AttemptState::Succeeded(transcript),
                        Err(message) => {
                            tracing::warn!(
                                video_id,
                                attempt = attempt + 1,
                                error = %message,
                                "transcript attempt failed"
                            );
                            match classify_failure(&message).terminal_message() {
                                Some(terminal) => AttemptState::TerminalFailed(terminal),
                                None if attempt + 1 < max_attempts => {
                                    AttemptState::Backoff { attempt }
                                }
                                None => AttemptState::Exhausted {
                                    last_error: message,
                                },
                            }
                        }
                    }
                }
                AttemptState::Backoff { attempt } => {
                    let delay = self.policy.backoff_delay(attempt);
                    tracing::info!(
                        video_id,
                        wait_secs = delay.as_secs_f64(),
                        "waiting before retry"
                    );
                    self.sleeper.sleep(delay).await;
                    AttemptState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                AttemptState::Succeeded(transcript) => {
                    tracing::info!(
                        video_id,
                        segment_count = transcript.segments.len(),
                        language = %transcript.language,
                        "transcript extracted"
                    );
                    return Ok(transcript);
                }
                AttemptState::TerminalFailed(message) => {
                    return Err(TranscriptFailure::Terminal(message.to_string()));
                }
                AttemptState::Exhausted { last_error } => {
                    return Err(TranscriptFailure::Exhausted {
                        attempts: max_attempts,
                        last_error,
                    });
                }
            };
        }
    }

    async fn attempt(&self, video_id: &str) -> Result<Transcript, String> {
        let (language, raw) = match self
            .source
            .fetch(video_id, &self.policy.preferred_languages)
            .await
        {
            Ok(fetched) => {
                tracing::debug!(
                    video_id,
                    track_language = %fetched.language_code,
                    segment_count = fetched.segments.len(),
                    "got preferred-language transcript"
                );
                (DEFAULT_TRANSCRIPT_LANGUAGE.to_string(), fetched.segments)
            }
            Err(err) => {
                tracing::info!(video_id, error = %err, "no preferred-language transcript");
                self.fetch_first_available(video_id)
                    .await
                    .map_err(|err| format!("No transcripts found: {err}"))?
            }
        };

        let segments = normalize_segments(raw);
        if segments.is_empty() {
            return Err("Transcript is empty".to_string());
        }

        Ok(Transcript { language, segments })
    }

    async fn fetch_first_available(
        &self,
        video_id: &str,
    ) -> Result<(String, Vec<RawCaptionSegment>), String> {
        let tracks = self
            .source
            .list(video_id)
            .await
            .map_err(|err| err.to_string())?;
        let track = tracks
            .into_iter()
            .next()
            .ok_or_else(|| "No transcripts available".to_string())?;
        let raw = self
            .source
            .fetch_track(video_id, &track)
            .await
            .map_err(|err| err.to_string())?;

        tracing::info!(
            video_id,
            language = %track.language_code,
            segment_count = raw.len(),
            "using first available transcript"
        );
        Ok((track.language_code, raw))
    }
}
