//! Extraction of structured answers from free-form completions.
//!
//! Models wrap their JSON in prose or markdown fences. The span between the
//! first `{` and the last `}` is taken as the candidate object, then every
//! field is coerced into the closed vocabulary.

use serde_json::Value;
use thiserror::Error;

use smart_ticket_core::types::{
    ClassificationResult, TicketCategory, TicketPriority, TicketType, DEFAULT_SUGGESTED_RESPONSE,
};

/// Keys that may carry the suggested response, in order of preference.
const RESPONSE_KEYS: [&str; 2] = ["suggestedResponse", "response"];

/// Why a completion could not be turned into a classification.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("completion contains no JSON object")]
    NoJsonSpan,

    #[error("completion JSON is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Greedy span from the first `{` to the last `}`, inclusive.
pub fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a classification completion.
pub fn parse_classification(completion: &str) -> Result<ClassificationResult, ExtractError> {
    let span = json_span(completion).ok_or(ExtractError::NoJsonSpan)?;
    // A span delimited by braces only ever parses as an object.
    let value: Value = serde_json::from_str(span)?;
    Ok(coerce_classification(&value))
}

/// Map an untrusted JSON object onto a classification. Never fails.
pub fn coerce_classification(value: &Value) -> ClassificationResult {
    let text = RESPONSE_KEYS
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .unwrap_or(DEFAULT_SUGGESTED_RESPONSE);

    ClassificationResult::new(
        TicketType::from_model(value.get("type")),
        TicketCategory::from_model(value.get("category")),
        TicketPriority::from_model(value.get("priority")),
        text,
    )
}

/// Read a one-word category answer.
///
/// Surrounding whitespace, quotes and punctuation are ignored and the answer
/// is lowercased. When the answer is a sentence, its first word naming a
/// category wins.
pub fn parse_category(completion: &str) -> Option<TicketCategory> {
    let answer = completion.trim().to_lowercase();
    let bare = answer.trim_matches(|c: char| !c.is_alphanumeric());

    TicketCategory::parse(bare).or_else(|| {
        bare.split(|c: char| !c.is_ascii_alphabetic())
            .find_map(TicketCategory::parse)
    })
}
