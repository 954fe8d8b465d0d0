use super::types::{AnalysisRequest, EndpointKind};
use serde_json::{Map, Value};
use thiserror::Error;

/// A request rejected before reaching any backend. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing '{field}' field in request body")]
    MissingField { field: &'static str },

    #[error("{}", empty_text_message(.field))]
    EmptyText { field: &'static str },

    #[error("'{field}' must be a non-empty list of strings")]
    EmptyList { field: &'static str },
}

// Detection clients match on the wording for `text`.
fn empty_text_message(field: &str) -> String {
    match field {
        "text" => "Text must be a non-empty string".to_string(),
        other => format!("'{}' must be a non-empty string", other),
    }
}

/// Parses a raw request body and validates it for `kind`.
pub fn validate_bytes(kind: EndpointKind, body: &[u8]) -> Result<AnalysisRequest, ValidationError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::NotAnObject)?;
    validate(kind, &value)
}

/// Checks `body` against the field list of `kind`, reporting the first
/// violation in declaration order.
pub fn validate(kind: EndpointKind, body: &Value) -> Result<AnalysisRequest, ValidationError> {
    let object = body.as_object().ok_or(ValidationError::NotAnObject)?;

    // Struct fields are evaluated in the order written, which is the
    // declaration order of `EndpointKind::fields`.
    let request = match kind {
        EndpointKind::Detect | EndpointKind::Classify | EndpointKind::HostedFillMask => {
            AnalysisRequest::Text {
                text: text_field(object, "text")?,
            }
        }
        EndpointKind::HostedSimilarity => AnalysisRequest::SourceSentences {
            source_sentence: text_field(object, "source_sentence")?,
            sentences: list_field(object, "sentences")?,
        },
        EndpointKind::PairwiseSimilarity => AnalysisRequest::TextPair {
            text1: text_field(object, "text1")?,
            text2: text_field(object, "text2")?,
        },
        EndpointKind::Rank => AnalysisRequest::QueryPassages {
            query: text_field(object, "query")?,
            passages: list_field(object, "passages")?,
        },
        EndpointKind::Similarity => AnalysisRequest::SentencePairs {
            sentences1: list_field(object, "sentences1")?,
            sentences2: list_field(object, "sentences2")?,
        },
        EndpointKind::Chat => AnalysisRequest::Message {
            message: text_field(object, "message")?,
        },
    };

    Ok(request)
}

fn present<'a>(object: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, ValidationError> {
    object
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or(ValidationError::MissingField { field: name })
}

fn text_field(object: &Map<String, Value>, name: &'static str) -> Result<String, ValidationError> {
    match present(object, name)?.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(ValidationError::EmptyText { field: name }),
    }
}

fn list_field(object: &Map<String, Value>, name: &'static str) -> Result<Vec<String>, ValidationError> {
    let invalid = || ValidationError::EmptyList { field: name };
    let items = present(object, name)?.as_array().ok_or_else(invalid)?;
    if items.is_empty() {
        return Err(invalid());
    }
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)
}
