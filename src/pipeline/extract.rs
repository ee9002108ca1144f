//! Structured payloads out of free-form model text.
//!
//! Two independent steps with their own error kinds:
//! 1. [`parse_json_payload`]: find the JSON object and parse it
//!    (`PipelineError::MalformedResponse`).
//! 2. [`validate_payload`]: deserialize into a [`Schema`] type and run its
//!    checks (`PipelineError::SchemaValidation`).

use serde_json::Value;

use super::types::Schema;
use crate::error::PipelineError;

/// First complete JSON object in `text`.
///
/// Each `{` is tried as a start position and parsed as a stream, so text
/// before the object (including stray braces) and text after it are both
/// ignored. Markdown fences need no special casing. On failure the error
/// from the earliest candidate is returned, which for a cut-off reply is the
/// EOF position.
pub fn extract_json_object(text: &str) -> Result<Value, String> {
    let mut earliest_error: Option<String> = None;

    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if value.is_object() => return Ok(value),
            Some(Err(e)) => {
                earliest_error.get_or_insert_with(|| e.to_string());
            }
            _ => {}
        }
    }

    Err(earliest_error.unwrap_or_else(|| "no JSON object found in response".to_string()))
}

/// Step 1: locate and parse the JSON object in `raw`.
pub fn parse_json_payload(raw: &str) -> Result<Value, PipelineError> {
    let malformed = |reason: String| PipelineError::MalformedResponse {
        reason,
        raw: raw.to_string(),
    };

    if raw.trim().is_empty() {
        return Err(malformed("response was empty".to_string()));
    }
    extract_json_object(raw).map_err(malformed)
}

/// Step 2: validate a parsed value against `T`.
pub fn validate_payload<T: Schema>(value: Value, raw: &str) -> Result<T, PipelineError> {
    let typed: T = serde_json::from_value(value).map_err(|e| PipelineError::SchemaValidation {
        reason: e.to_string(),
        raw: raw.to_string(),
    })?;
    typed.check().map_err(|reason| PipelineError::SchemaValidation {
        reason,
        raw: raw.to_string(),
    })?;
    Ok(typed)
}

/// Both steps.
pub fn parse_structured<T: Schema>(raw: &str) -> Result<T, PipelineError> {
    let value = parse_json_payload(raw)?;
    validate_payload(value, raw)
}
