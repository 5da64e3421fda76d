//! Marker-block parsing of assistant replies.
//!
//! The system prompt asks the model to embed JSON payloads between literal
//! marker tokens: `TITLE_HEADLINE_START{...}TITLE_HEADLINE_END` and
//! `EVENT_DATA_START{...}EVENT_DATA_END`. This module pulls those payloads
//! out and strips the blocks from the user-visible text. Marker search is
//! plain first-index substring search per token, so duplicated markers use
//! the first occurrence of each. Every failure degrades silently: the
//! corresponding field stays unset, the block is still stripped, and no
//! error reaches the caller.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

pub const TITLE_HEADLINE_START: &str = "TITLE_HEADLINE_START";
pub const TITLE_HEADLINE_END: &str = "TITLE_HEADLINE_END";
pub const EVENT_DATA_START: &str = "EVENT_DATA_START";
pub const EVENT_DATA_END: &str = "EVENT_DATA_END";

/// Suggested event title and one-line tagline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleHeadline {
    pub title: String,
    pub headline: String,
}

/// Structured event draft proposed by the assistant. Only `title` and
/// `activity` are required; everything else the model emits is carried
/// through untouched for the event form to pre-fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPreviewData {
    pub title: String,
    pub activity: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One parsed assistant turn: structured payloads plus the display text with
/// all marker blocks removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedAiResponse {
    pub title_headline: Option<TitleHeadline>,
    pub event_data: Option<EventPreviewData>,
    pub cleaned_text: String,
}

/// Parses one assistant reply. Never fails; malformed blocks are logged and
/// dropped while still being stripped from `cleaned_text`.
pub fn parse_response(text: &str) -> ParsedAiResponse {
    let (text, title_payload) = take_marker_block(text, TITLE_HEADLINE_START, TITLE_HEADLINE_END);
    let title_headline = title_payload.and_then(|raw| parse_title_headline(&raw));

    // The event pass runs over the text with the title block already removed.
    let (text, event_payload) = take_marker_block(&text, EVENT_DATA_START, EVENT_DATA_END);
    let event_data = event_payload.and_then(|raw| parse_event_data(&raw));

    ParsedAiResponse {
        title_headline,
        event_data,
        cleaned_text: text.trim().to_string(),
    }
}

/// Locates one marker pair and splits the block out of the text.
///
/// Returns the text with the block removed plus the trimmed payload between
/// the markers. If either marker is missing the text is returned unchanged
/// with no payload. If the end marker comes first the span between the two
/// tokens is still stripped, so marker text never leaks into display text,
/// but the payload is treated as unreadable.
fn take_marker_block(text: &str, start_marker: &str, end_marker: &str) -> (String, Option<String>) {
    let (Some(start_idx), Some(end_idx)) = (text.find(start_marker), text.find(end_marker)) else {
        return (text.to_string(), None);
    };

    let content_start = start_idx + start_marker.len();
    if end_idx < content_start {
        // End token before (or overlapping) the start token: the payload is
        // unreadable, but the span between the two tokens is still stripped
        // so marker text never reaches display text.
        warn!("inverted {start_marker} block, stripping without extraction");
        let cut = end_idx.min(start_idx);
        let remaining = format!("{}{}", &text[..cut], &text[content_start..]);
        return (remaining, None);
    }

    let payload = text[content_start..end_idx].trim().to_string();
    let remaining = format!("{}{}", &text[..start_idx], &text[end_idx + end_marker.len()..]);
    (remaining, Some(payload))
}

fn parse_title_headline(raw: &str) -> Option<TitleHeadline> {
    match serde_json::from_str::<TitleHeadline>(raw) {
        Ok(parsed) if !parsed.title.is_empty() && !parsed.headline.is_empty() => Some(parsed),
        Ok(_) => {
            error!("title/headline block has empty required fields");
            None
        }
        Err(e) => {
            error!("failed to parse title/headline block: {e}");
            None
        }
    }
}

fn parse_event_data(raw: &str) -> Option<EventPreviewData> {
    match serde_json::from_str::<EventPreviewData>(raw) {
        Ok(parsed) if !parsed.title.is_empty() && !parsed.activity.is_empty() => Some(parsed),
        Ok(_) => {
            error!("event data block has empty required fields");
            None
        }
        Err(e) => {
            error!("failed to parse event data block: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKERS: [&str; 4] = [
        TITLE_HEADLINE_START,
        TITLE_HEADLINE_END,
        EVENT_DATA_START,
        EVENT_DATA_END,
    ];

    fn assert_no_markers(cleaned: &str) {
        for marker in MARKERS {
            assert!(!cleaned.contains(marker), "cleaned text contains {marker}");
        }
    }

    #[test]
    fn plain_text_passes_through_trimmed() {
        let parsed = parse_response("  just a friendly reply \n");
        assert_eq!(parsed.cleaned_text, "just a friendly reply");
        assert!(parsed.title_headline.is_none());
        assert!(parsed.event_data.is_none());
    }

    #[test]
    fn both_blocks_are_extracted_and_stripped() {
        let input = r#"Hello TITLE_HEADLINE_START{"title":"T","headline":"H"}TITLE_HEADLINE_END world EVENT_DATA_START{"title":"T2","activity":"hiking"}EVENT_DATA_END!"#;
        let parsed = parse_response(input);

        assert_eq!(
            parsed.title_headline,
            Some(TitleHeadline {
                title: "T".to_string(),
                headline: "H".to_string(),
            })
        );
        let event = parsed.event_data.unwrap();
        assert_eq!(event.title, "T2");
        assert_eq!(event.activity, "hiking");
        assert_eq!(parsed.cleaned_text, "Hello  world !");
    }

    #[test]
    fn extra_event_fields_pass_through() {
        let input = r#"EVENT_DATA_START{"title":"Picnic","activity":"picnic","location":"Vondelpark","maxDuos":4}EVENT_DATA_END"#;
        let event = parse_response(input).event_data.unwrap();
        assert_eq!(
            event.extra.get("location").and_then(|v| v.as_str()),
            Some("Vondelpark")
        );
        assert_eq!(event.extra.get("maxDuos").and_then(|v| v.as_i64()), Some(4));
    }

    #[test]
    fn malformed_json_is_dropped_but_block_still_stripped() {
        let input = r#"Before TITLE_HEADLINE_START{"title":"T","headline":}TITLE_HEADLINE_END after"#;
        let parsed = parse_response(input);
        assert!(parsed.title_headline.is_none());
        assert_eq!(parsed.cleaned_text, "Before  after");
        assert_no_markers(&parsed.cleaned_text);
    }

    #[test]
    fn empty_required_field_is_discarded() {
        let input = r#"TITLE_HEADLINE_START{"title":"","headline":"H"}TITLE_HEADLINE_END rest"#;
        let parsed = parse_response(input);
        assert!(parsed.title_headline.is_none());
        assert_eq!(parsed.cleaned_text, "rest");
    }

    #[test]
    fn event_block_missing_activity_is_discarded() {
        let input = r#"EVENT_DATA_START{"title":"T"}EVENT_DATA_END text"#;
        let parsed = parse_response(input);
        assert!(parsed.event_data.is_none());
        assert_eq!(parsed.cleaned_text, "text");
    }

    #[test]
    fn missing_end_marker_leaves_text_untouched() {
        let input = r#"TITLE_HEADLINE_START{"title":"T","headline":"H"} and no end"#;
        let parsed = parse_response(input);
        assert!(parsed.title_headline.is_none());
        assert_eq!(parsed.cleaned_text, input.trim());
    }

    #[test]
    fn duplicated_start_marker_uses_first_occurrence() {
        let input = r#"TITLE_HEADLINE_START garbage TITLE_HEADLINE_START{"title":"T","headline":"H"}TITLE_HEADLINE_END tail"#;
        let parsed = parse_response(input);
        // The span from the first start marker to the end marker is not
        // valid JSON, so extraction fails but the span is still removed.
        assert!(parsed.title_headline.is_none());
        assert_eq!(parsed.cleaned_text, "tail");
        assert_no_markers(&parsed.cleaned_text);
    }

    #[test]
    fn inverted_markers_strip_without_extraction() {
        let input = r#"a TITLE_HEADLINE_END middle TITLE_HEADLINE_START b"#;
        let parsed = parse_response(input);
        assert!(parsed.title_headline.is_none());
        assert_no_markers(&parsed.cleaned_text);
    }

    #[test]
    fn title_removal_happens_before_event_pass() {
        // The event block sits inside the title block's span; once the title
        // block is stripped, no event markers remain.
        let input = r#"TITLE_HEADLINE_START EVENT_DATA_START{"title":"T","activity":"a"}EVENT_DATA_END TITLE_HEADLINE_END done"#;
        let parsed = parse_response(input);
        assert!(parsed.title_headline.is_none());
        assert!(parsed.event_data.is_none());
        assert_eq!(parsed.cleaned_text, "done");
    }

    #[test]
    fn whitespace_around_payload_is_tolerated() {
        let input = "TITLE_HEADLINE_START \n {\"title\":\"T\",\"headline\":\"H\"} \n TITLE_HEADLINE_END";
        let parsed = parse_response(input);
        assert_eq!(parsed.title_headline.unwrap().title, "T");
        assert_eq!(parsed.cleaned_text, "");
    }
}
