//! Pure parsing of watch pages, innertube player responses and timedtext XML.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use ingest_domain::{CaptionSourceError, CaptionTrack, RawCaptionSegment};

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid regex")
});
static CONSENT_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="v" value="(.*?)""#).expect("valid regex"));
static TEXT_ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)"#).expect("valid regex")
});
static ATTRIBUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex"));

const CONSENT_FORM_MARKER: &str = "action=\"https://consent.youtube.com/s\"";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";

pub fn extract_api_key(html: &str) -> Option<String> {
    API_KEY_RE
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}

pub fn is_consent_page(html: &str) -> bool {
    html.contains(CONSENT_FORM_MARKER)
}

pub fn extract_consent_value(html: &str) -> Option<String> {
    CONSENT_VALUE_RE
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}

pub fn is_recaptcha_page(html: &str) -> bool {
    html.contains(RECAPTCHA_MARKER)
}

/// Caption tracks from an innertube player response: manual tracks first, then
/// auto-generated ones, each group in the order the source lists them.
pub fn parse_player_response(
    video_id: &str,
    player: &Value,
) -> Result<Vec<CaptionTrack>, CaptionSourceError> {
    check_playability(video_id, player)?;

    let caption_tracks = player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
        .filter(|tracks| !tracks.is_empty())
        .ok_or_else(|| CaptionSourceError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        })?;

    let (mut manual, generated): (Vec<_>, Vec<_>) = caption_tracks
        .iter()
        .filter_map(parse_track)
        .partition(|track| !track.is_generated);
    manual.extend(generated);
    Ok(manual)
}

fn check_playability(video_id: &str, player: &Value) -> Result<(), CaptionSourceError> {
    let status = player
        .pointer("/playabilityStatus/status")
        .and_then(Value::as_str)
        .unwrap_or("OK");
    if status == "OK" {
        return Ok(());
    }

    let reason = player
        .pointer("/playabilityStatus/reason")
        .and_then(Value::as_str)
        .unwrap_or("no reason given")
        .to_string();
    let lowered = reason.to_lowercase();

    match status {
        "LOGIN_REQUIRED" if lowered.contains("not a bot") => {
            Err(CaptionSourceError::RequestBlocked(reason))
        }
        "ERROR" if lowered.contains("unavailable") => Err(CaptionSourceError::VideoUnavailable {
            video_id: video_id.to_string(),
            reason,
        }),
        _ => Err(CaptionSourceError::Http(format!(
            "video {video_id} is not playable ({status}): {reason}"
        ))),
    }
}

fn parse_track(track: &Value) -> Option<CaptionTrack> {
    let base_url = track.get("baseUrl")?.as_str()?.to_string();
    let language_code = track.get("languageCode")?.as_str()?.to_string();
    let language = track
        .pointer("/name/runs/0/text")
        .or_else(|| track.pointer("/name/simpleText"))
        .and_then(Value::as_str)
        .unwrap_or(&language_code)
        .to_string();
    let is_generated = track.get("kind").and_then(Value::as_str) == Some("asr");

    Some(CaptionTrack {
        language_code,
        language,
        is_generated,
        base_url,
    })
}

/// First track matching `languages` in priority order; manual beats generated
/// for the same language.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|language| {
        tracks
            .iter()
            .find(|track| !track.is_generated && &track.language_code == language)
            .or_else(|| {
                tracks
                    .iter()
                    .find(|track| track.is_generated && &track.language_code == language)
            })
    })
}

pub fn timedtext_url(base_url: &str) -> String {
    base_url.replace("&fmt=srv3", "")
}

/// Each `<text start=".." dur="..">` element becomes one snippet. Empty and self-closing
/// elements are kept here and dropped by segment normalization.
pub fn parse_timedtext(xml: &str) -> Result<Vec<RawCaptionSegment>, CaptionSourceError> {
    if !xml.contains("<transcript") && !xml.contains("<text") {
        return Err(CaptionSourceError::Parse(
            "timedtext response has no transcript element".to_string(),
        ));
    }

    let segments = TEXT_ELEMENT_RE
        .captures_iter(xml)
        .map(|captures| {
            let attributes = captures.get(1).map_or("", |value| value.as_str());
            let body = captures.get(2).map_or("", |value| value.as_str());

            let mut start = 0.0;
            let mut duration = 0.0;
            for attribute in ATTRIBUTE_RE.captures_iter(attributes) {
                let value = attribute[2].parse().unwrap_or(0.0);
                match &attribute[1] {
                    "start" => start = value,
                    "dur" => duration = value,
                    _ => {}
                }
            }

            // Entities are escaped twice: once for XML, once for the HTML payload.
            let text = decode_entities(&TAG_RE.replace_all(&decode_entities(body), ""));
            RawCaptionSegment::snippet(text, start, duration)
        })
        .collect();

    Ok(segments)
}

pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |captures: &regex::Captures<'_>| {
            let entity = &captures[1];
            decode_entity(entity).unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    let decoded = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(decoded.to_string())
}
