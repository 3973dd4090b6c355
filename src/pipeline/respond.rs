//! Response composer: converted bytes → HTTP response.
//!
//! Two shapes, chosen by the `Accept` header:
//! - raw bytes with the format's media type as `content-type` (default)
//! - a JSON [`Envelope`] when any `Accept` value mentions `application/json`

use crate::format::TargetFormat;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

const JSON_MEDIA_TYPE: &str = "application/json";

/// JSON wrapper around converted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// html as text; every other format base64-encoded.
    pub output: String,
    /// Whether `output` is base64.
    pub base64: bool,
    /// Media type of the decoded output.
    pub content_type: String,
}

impl Envelope {
    pub fn new(bytes: &[u8], format: TargetFormat) -> Self {
        let output = if format.is_text() {
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            STANDARD.encode(bytes)
        };
        Self {
            output,
            base64: !format.is_text(),
            content_type: format.media_type().to_string(),
        }
    }
}

/// Whether the requester listed `application/json` in any `Accept` header.
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains(JSON_MEDIA_TYPE))
}

/// Build the success response for `bytes` converted to `format`.
pub fn compose(bytes: Vec<u8>, format: TargetFormat, headers: &HeaderMap) -> Response {
    if wants_json(headers) {
        debug!("Wrapping {} bytes of {} in a JSON envelope", bytes.len(), format);
        return Json(Envelope::new(&bytes, format)).into_response();
    }
    ([(CONTENT_TYPE, format.media_type())], bytes).into_response()
}
