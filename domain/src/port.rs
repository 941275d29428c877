use std::sync::Arc;

use async_trait::async_trait;

use crate::{CaptionSourceError, CaptionTrack, DomainError, Embedding, FetchedCaptions, RawCaptionSegment};

#[async_trait]
pub trait CaptionSourcePort: Send + Sync {
    /// Fetch the first transcript matching `languages`, in priority order.
    async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<FetchedCaptions, CaptionSourceError>;

    /// Every transcript the source offers for `video_id`, in the source's own order.
    async fn list(&self, video_id: &str) -> Result<Vec<CaptionTrack>, CaptionSourceError>;

    async fn fetch_track(
        &self,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Result<Vec<RawCaptionSegment>, CaptionSourceError>;
}

#[async_trait]
pub trait TextEncoderPort: Send + Sync {
    fn dimension(&self) -> usize;

    /// Encode one batch; the output has one vector per input, in input order.
    async fn encode(&self, texts: Vec<String>) -> Result<Vec<Embedding>, DomainError>;
}

#[async_trait]
pub trait EncoderLoaderPort: Send + Sync {
    fn model_name(&self) -> &str;

    async fn load(&self) -> Result<Arc<dyn TextEncoderPort>, DomainError>;
}
