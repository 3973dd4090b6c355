//! Request validation: raw body bytes → [`ConversionRequest`].
//!
//! The body is parsed into a loose [`serde_json::Value`] rather than a typed
//! struct so that each kind of bad input gets its own error: unparseable
//! bytes are `InvalidEncoding`, a missing or blank `text`/`to` is
//! `MissingField`, and a well-formed but unknown `to` is `UnsupportedFormat`.

use crate::error::RenderError;
use crate::format::TargetFormat;
use serde_json::Value;
use tracing::debug;

/// A validated conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Markdown source, passed to the engine untrimmed. Never blank.
    pub source_text: String,
    pub target_format: TargetFormat,
    /// Wrap html output in a full document. Ignored for other formats.
    pub standalone: bool,
    /// Inline linked resources into html output. Ignored for other formats.
    pub embed_resources: bool,
}

impl ConversionRequest {
    /// A request with both html flags off.
    pub fn new(source_text: impl Into<String>, target_format: TargetFormat) -> Self {
        Self {
            source_text: source_text.into(),
            target_format,
            standalone: false,
            embed_resources: false,
        }
    }
}

/// Parse and validate a request body.
///
/// Field rules:
/// - `text`: string with at least one non-whitespace character
/// - `to`: same, then one of `docx`, `pptx`, `html` (exact match)
/// - `standalone`, `embed-resources`: optional, truthy values enable them
///
/// A body that is valid JSON but not an object has no fields, so it fails
/// on `text`.
pub fn parse_request(bytes: &[u8]) -> Result<ConversionRequest, RenderError> {
    let body: Value = serde_json::from_slice(bytes).map_err(RenderError::InvalidEncoding)?;

    let source_text = required_str(&body, "text")?;
    let format = required_str(&body, "to")?;
    let target_format: TargetFormat = format.parse()?;

    let request = ConversionRequest {
        source_text: source_text.to_string(),
        target_format,
        standalone: truthy(body.get("standalone")),
        embed_resources: truthy(body.get("embed-resources")),
    };
    debug!(
        "Validated request: to={} text={} bytes standalone={} embed_resources={}",
        request.target_format,
        request.source_text.len(),
        request.standalone,
        request.embed_resources
    );
    Ok(request)
}

fn required_str<'a>(body: &'a Value, field: &'static str) -> Result<&'a str, RenderError> {
    match body.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(RenderError::MissingField { field }),
    }
}

/// Loose truthiness for optional flags: `false`, `null`, `0` and `""` are off.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
