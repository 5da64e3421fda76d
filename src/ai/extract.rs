//! Text extraction from the provider's raw completion result.
//!
//! Providers disagree on where the reply text lives, so the raw result is a
//! loose shape with three tolerated layouts, tried in fixed priority order.
//! Extraction never fails: every dead end degrades to an empty string with a
//! diagnostic log, and callers treat `""` as "no text".

use serde::Deserialize;
use tracing::warn;

type ProducerError = Box<dyn std::error::Error + Send + Sync>;

/// Deferred text supplier, used by providers that assemble the reply lazily
/// (e.g. by concatenating previously streamed chunks on demand).
pub type TextProducer = Box<dyn Fn() -> Result<String, ProducerError> + Send + Sync>;

/// The `text` field of a response payload: either already a string, or a
/// producer that has to be invoked to get one.
pub enum TextField {
    Producer(TextProducer),
    Literal(String),
}

/// Gemini-style candidate list, the third tolerated layout.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Default)]
pub struct ResponsePayload {
    pub text: Option<TextField>,
    pub candidates: Option<Vec<Candidate>>,
}

/// Raw completion result as returned by an AI provider client.
pub struct RawAiResult {
    pub response: Option<ResponsePayload>,
}

impl RawAiResult {
    pub fn empty() -> Self {
        Self { response: None }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            response: Some(ResponsePayload {
                text: Some(TextField::Literal(text.into())),
                candidates: None,
            }),
        }
    }

    pub fn from_producer(producer: TextProducer) -> Self {
        Self {
            response: Some(ResponsePayload {
                text: Some(TextField::Producer(producer)),
                candidates: None,
            }),
        }
    }

    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            response: Some(ResponsePayload {
                text: None,
                candidates: Some(candidates),
            }),
        }
    }
}

/// Extracts the reply text from a raw result, or `""` if none is found.
///
/// Priority order:
/// 1. a [`TextField::Producer`] — invoked guarded; a failing producer yields
///    `""` directly, with NO fallback to the remaining strategies
/// 2. a [`TextField::Literal`] — returned as-is, including when empty
/// 3. `candidates[0].content.parts[0].text`
pub fn extract_text(result: &RawAiResult) -> String {
    let Some(response) = &result.response else {
        warn!("AI result carried no response payload");
        return String::new();
    };

    match &response.text {
        Some(TextField::Producer(produce)) => match produce() {
            Ok(text) => text,
            Err(e) => {
                warn!("AI response text producer failed: {e}");
                String::new()
            }
        },
        Some(TextField::Literal(text)) => text.clone(),
        None => first_candidate_text(response).unwrap_or_else(|| {
            warn!("no text found in AI result");
            String::new()
        }),
    }
}

fn first_candidate_text(response: &ResponsePayload) -> Option<String> {
    response
        .candidates
        .as_deref()?
        .first()?
        .content
        .as_ref()?
        .parts
        .first()?
        .text
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str) -> Candidate {
        Candidate {
            content: Some(CandidateContent {
                parts: vec![CandidatePart {
                    text: Some(text.to_string()),
                }],
            }),
        }
    }

    #[test]
    fn producer_text_is_invoked() {
        let result = RawAiResult::from_producer(Box::new(|| Ok("abc".to_string())));
        assert_eq!(extract_text(&result), "abc");
    }

    #[test]
    fn failing_producer_yields_empty_without_fallback() {
        // Candidates are present alongside the producer, but a failing
        // producer must not fall through to them.
        let result = RawAiResult {
            response: Some(ResponsePayload {
                text: Some(TextField::Producer(Box::new(|| Err("boom".into())))),
                candidates: Some(vec![candidate("fallback")]),
            }),
        };
        assert_eq!(extract_text(&result), "");
    }

    #[test]
    fn literal_text_is_returned_directly() {
        assert_eq!(extract_text(&RawAiResult::from_text("hello")), "hello");
    }

    #[test]
    fn empty_literal_is_returned_as_is() {
        assert_eq!(extract_text(&RawAiResult::from_text("")), "");
    }

    #[test]
    fn candidates_shape_is_read() {
        let result = RawAiResult::from_candidates(vec![candidate("x")]);
        assert_eq!(extract_text(&result), "x");
    }

    #[test]
    fn only_first_candidate_is_considered() {
        let result = RawAiResult::from_candidates(vec![candidate("first"), candidate("second")]);
        assert_eq!(extract_text(&result), "first");
    }

    #[test]
    fn missing_response_yields_empty() {
        assert_eq!(extract_text(&RawAiResult::empty()), "");
    }

    #[test]
    fn empty_candidate_list_yields_empty() {
        assert_eq!(extract_text(&RawAiResult::from_candidates(vec![])), "");
    }

    #[test]
    fn candidate_without_part_text_yields_empty() {
        let result = RawAiResult::from_candidates(vec![Candidate {
            content: Some(CandidateContent {
                parts: vec![CandidatePart { text: None }],
            }),
        }]);
        assert_eq!(extract_text(&result), "");
    }

    #[test]
    fn candidates_json_deserializes() {
        let json = r#"[{"content": {"parts": [{"text": "from json"}]}}]"#;
        let candidates: Vec<Candidate> = serde_json::from_str(json).unwrap();
        let result = RawAiResult::from_candidates(candidates);
        assert_eq!(extract_text(&result), "from json");
    }
}
