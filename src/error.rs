//! Error types for the pandoc-renderer gateway.
//!
//! Every stage of the request pipeline returns [`RenderError`]. Keeping the
//! whole taxonomy in one enum gives the dispatcher a single place to turn a
//! failure into an HTTP status: [`RenderError::status`] is that mapping, and
//! the [`IntoResponse`] impl renders it as `{"error": "<message>"}`.
//!
//! | Kind | Raised by | Status |
//! |------|-----------|--------|
//! | `TransportError` | body reader | 500 |
//! | `PayloadTooLarge` | body reader | 413 |
//! | `InvalidEncoding`, `MissingField`, `UnsupportedFormat` | validator | 400 |
//! | `SpawnError`, `ConversionFailed` | invoker | 500 |
//!
//! `InvalidConfig`, `Bind` and `Server` belong to the server lifecycle and
//! never reach a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// All errors produced by the gateway.
#[derive(Debug, Error)]
pub enum RenderError {
    // ── Request ingestion ─────────────────────────────────────────────────
    /// The request body stream failed before it completed.
    #[error("Failed to read request body: {0}")]
    TransportError(String),

    /// The request body exceeded the configured byte cap.
    #[error("Request body too large")]
    PayloadTooLarge { limit: usize },

    // ── Validation ────────────────────────────────────────────────────────
    /// The body is not parseable JSON.
    #[error("Invalid JSON")]
    InvalidEncoding(#[source] serde_json::Error),

    /// A required field is absent, not a string, or blank.
    #[error("Missing text/to: '{field}' must be a non-empty string")]
    MissingField { field: &'static str },

    /// `to` names a format outside the supported set.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ── Conversion engine ─────────────────────────────────────────────────
    /// The engine process could not be started.
    #[error("Failed to start {program}: {reason}")]
    SpawnError { program: String, reason: String },

    /// The engine exited non-zero or was killed.
    ///
    /// Carries the engine's trimmed diagnostic output, or an
    /// "exited with code/signal" line when it wrote nothing.
    #[error("{0}")]
    ConversionFailed(String),

    // ── Server lifecycle ──────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The listening socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("HTTP server error: {0}")]
    Server(#[source] std::io::Error),
}

impl RenderError {
    /// HTTP status this error maps to at the dispatcher boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            RenderError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RenderError::InvalidEncoding(_)
            | RenderError::MissingField { .. }
            | RenderError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            RenderError::TransportError(_)
            | RenderError::SpawnError { .. }
            | RenderError::ConversionFailed(_)
            | RenderError::InvalidConfig(_)
            | RenderError::Bind { .. }
            | RenderError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if self.is_client_error() {
            debug!(status = status.as_u16(), error = %message, "request rejected");
        } else {
            error!(status = status.as_u16(), error = %message, "request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
