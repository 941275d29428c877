use serde_json::{Map, Value};

use crate::{RawCaptionSegment, TranscriptSegment};

/// Turn raw caption records into segments, keeping source order and dropping blanks.
pub fn normalize_segments(raw: Vec<RawCaptionSegment>) -> Vec<TranscriptSegment> {
    raw.into_iter().filter_map(normalize_segment).collect()
}

pub fn normalize_segment(raw: RawCaptionSegment) -> Option<TranscriptSegment> {
    let (text, start, duration) = match raw {
        RawCaptionSegment::Snippet {
            text,
            start,
            duration,
        } => (text, start, duration),
        RawCaptionSegment::Record(record) => (
            record
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            number_field(&record, "start"),
            number_field(&record, "duration"),
        ),
        RawCaptionSegment::Unrecognized => return None,
    };

    let text = normalize_text(&text);
    if text.is_empty() {
        return None;
    }

    Some(TranscriptSegment {
        text,
        start: non_negative(start),
        duration: non_negative(duration),
    })
}

pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

fn number_field(record: &Map<String, Value>, key: &str) -> f64 {
    match record.get(key) {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(raw)) => raw.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
