//! Response normalisation: coerce free-form model text into JSON.
//!
//! Models are told to return bare JSON, but they regularly wrap it in a
//! Markdown code fence anyway (` ```json … ``` `). This stage strips that
//! wrapping and parses what is left. Model output is untrusted input, so the
//! outcome is always a value: a parse failure becomes
//! [`NormalizedResult::ParseError`] carrying the untouched raw text, and the
//! other prompts of the same request are unaffected.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Message stored in [`NormalizedResult::ParseError`].
pub const PARSE_ERROR_MESSAGE: &str = "Could not parse the response into JSON";

const FENCE: &str = "```";

/// Outcome of normalising one model response.
///
/// Serialises untagged: a parsed value is emitted as-is, a parse error as
/// `{"error": "...", "raw_response": "..."}`. No schema is enforced on the
/// parsed value; consumers get whatever shape the model produced.
///
/// Deserialising reads back only the exact error shape (two string fields
/// `error` and `raw_response`, nothing else) as `ParseError`; any other
/// value, including a model object that merely has those keys, is `Parsed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedResult {
    /// The text was not valid JSON, even after fence stripping.
    ParseError { error: String, raw_response: String },
    /// The text parsed as JSON.
    Parsed(Value),
}

impl NormalizedResult {
    pub fn parse_error(raw_response: impl Into<String>) -> Self {
        NormalizedResult::ParseError {
            error: PARSE_ERROR_MESSAGE.to_string(),
            raw_response: raw_response.into(),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, NormalizedResult::Parsed(_))
    }

    /// The parsed value, if parsing succeeded.
    pub fn value(&self) -> Option<&Value> {
        match self {
            NormalizedResult::Parsed(v) => Some(v),
            NormalizedResult::ParseError { .. } => None,
        }
    }
}

impl<'de> Deserialize<'de> for NormalizedResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Value::Object(map) = &value {
            if map.len() == 2 {
                if let (Some(Value::String(error)), Some(Value::String(raw))) =
                    (map.get("error"), map.get("raw_response"))
                {
                    return Ok(NormalizedResult::ParseError {
                        error: error.clone(),
                        raw_response: raw.clone(),
                    });
                }
            }
        }
        Ok(NormalizedResult::Parsed(value))
    }
}

/// Remove an outer Markdown code fence.
///
/// If the trimmed text starts with a fence, everything up to and including
/// the first line break is dropped (this also drops a language tag such as
/// `json`). If it ends with a fence, the trailing marker is dropped. The
/// result is trimmed. Interior content is preserved verbatim.
pub fn strip_code_fences(text: &str) -> String {
    let mut cleaned = text.trim();
    if cleaned.starts_with(FENCE) {
        if let Some(newline) = cleaned.find('\n') {
            cleaned = &cleaned[newline + 1..];
        }
    }
    if let Some(stripped) = cleaned.strip_suffix(FENCE) {
        cleaned = stripped;
    }
    cleaned.trim().to_string()
}

/// Strip fences and parse as JSON. Never fails.
///
/// On failure `raw_response` is the original input, not the stripped text.
pub fn normalize_response(raw: &str) -> NormalizedResult {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => NormalizedResult::Parsed(value),
        Err(e) => {
            debug!("Model response is not JSON ({}); keeping raw text", e);
            NormalizedResult::parse_error(raw)
        }
    }
}
