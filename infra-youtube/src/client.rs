use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE},
    Client, StatusCode, Url,
};
use serde_json::{json, Value};

use ingest_domain::{
    CaptionSourceError, CaptionSourcePort, CaptionTrack, FetchedCaptions, RawCaptionSegment,
};

use crate::parse::{
    extract_api_key, extract_consent_value, is_consent_page, is_recaptcha_page,
    parse_player_response, parse_timedtext, select_track, timedtext_url,
};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

#[derive(Debug, Clone)]
pub struct YoutubeClientConfig {
    pub request_timeout: Duration,
    pub accept_language: String,
}

impl Default for YoutubeClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            accept_language: "en-US".to_string(),
        }
    }
}

/// Caption source backed by YouTube's watch page, innertube player API and timedtext feed.
pub struct YoutubeCaptionSource {
    http: Client,
}

impl YoutubeCaptionSource {
    pub fn new(config: YoutubeClientConfig) -> Result<Self, CaptionSourceError> {
        let mut headers = HeaderMap::new();
        let accept_language = HeaderValue::from_str(&config.accept_language)
            .map_err(|err| CaptionSourceError::Http(format!("invalid Accept-Language: {err}")))?;
        headers.insert(ACCEPT_LANGUAGE, accept_language);

        let http = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(http_error)?;

        Ok(Self { http })
    }

    async fn fetch_watch_html(&self, video_id: &str) -> Result<String, CaptionSourceError> {
        let url = Url::parse_with_params(WATCH_URL, &[("v", video_id)])
            .map_err(|err| CaptionSourceError::Http(err.to_string()))?;

        let html = self.get_text(url.clone(), None).await?;
        if !is_consent_page(&html) {
            return Ok(html);
        }

        tracing::debug!(video_id, "answering consent interstitial");
        let consent = extract_consent_value(&html).ok_or_else(|| {
            CaptionSourceError::RequestBlocked("consent form without a value".to_string())
        })?;
        let cookie = format!("CONSENT=YES+{consent}");
        let html = self.get_text(url, Some(&cookie)).await?;
        if is_consent_page(&html) {
            return Err(CaptionSourceError::RequestBlocked(
                "consent cookie was not accepted".to_string(),
            ));
        }
        Ok(html)
    }

    async fn get_text(&self, url: Url, cookie: Option<&str>) -> Result<String, CaptionSourceError> {
        let mut request = self.http.get(url);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request.send().await.map_err(http_error)?;
        let response = check_status(response)?;
        response.text().await.map_err(http_error)
    }

    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<Value, CaptionSourceError> {
        let url = Url::parse_with_params(INNERTUBE_PLAYER_URL, &[("key", api_key)])
            .map_err(|err| CaptionSourceError::Http(err.to_string()))?;
        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(http_error)?;
        let response = check_status(response)?;
        response
            .json::<Value>()
            .await
            .map_err(|err| CaptionSourceError::Parse(format!("player response: {err}")))
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CaptionSourceError> {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => Err(CaptionSourceError::RequestBlocked(format!(
            "{} returned 429 Too Many Requests",
            response.url()
        ))),
        status if !status.is_success() => Err(CaptionSourceError::Http(format!(
            "{} returned {status}",
            response.url()
        ))),
        _ => Ok(response),
    }
}

fn http_error(err: reqwest::Error) -> CaptionSourceError {
    CaptionSourceError::Http(err.to_string())
}

#[async_trait]
impl CaptionSourcePort for YoutubeCaptionSource {
    async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<FetchedCaptions, CaptionSourceError> {
        let tracks = self.list(video_id).await?;
        let track = select_track(&tracks, languages).ok_or_else(|| {
            CaptionSourceError::NoTranscriptFound {
                video_id: video_id.to_string(),
                requested: languages.join(", "),
            }
        })?;

        let segments = self.fetch_track(video_id, track).await?;
        Ok(FetchedCaptions {
            language_code: track.language_code.clone(),
            segments,
        })
    }

    async fn list(&self, video_id: &str) -> Result<Vec<CaptionTrack>, CaptionSourceError> {
        let html = self.fetch_watch_html(video_id).await?;
        let api_key = match extract_api_key(&html) {
            Some(key) => key,
            None if is_recaptcha_page(&html) => {
                return Err(CaptionSourceError::RequestBlocked(
                    "watch page answered with a reCAPTCHA".to_string(),
                ))
            }
            None => {
                return Err(CaptionSourceError::Parse(
                    "INNERTUBE_API_KEY not found in watch page".to_string(),
                ))
            }
        };

        let player = self.fetch_player(video_id, &api_key).await?;
        let tracks = parse_player_response(video_id, &player)?;
        tracing::debug!(video_id, track_count = tracks.len(), "caption tracks listed");
        Ok(tracks)
    }

    async fn fetch_track(
        &self,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Result<Vec<RawCaptionSegment>, CaptionSourceError> {
        let url = Url::parse(&timedtext_url(&track.base_url))
            .map_err(|err| CaptionSourceError::Parse(format!("caption track url: {err}")))?;
        let xml = self.get_text(url, None).await?;
        let segments = parse_timedtext(&xml)?;
        tracing::debug!(
            video_id,
            language = %track.language_code,
            generated = track.is_generated,
            segment_count = segments.len(),
            "caption track fetched"
        );
        Ok(segments)
    }
}
