//! Request handlers: the dispatcher side of the router.
//!
//! [`convert`] is the only handler with real work: it chains the pipeline
//! stages and lets `?` carry any [`RenderError`] out to its
//! `IntoResponse` impl, which is the single error-to-status mapping point.

use crate::error::RenderError;
use crate::pipeline::{body, respond, validate};
use crate::server::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /version`
pub async fn version() -> Json<Value> {
    Json(json!({ "pandoc": "renderer" }))
}

/// Any other method or path.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// `POST /`: read, validate, convert, respond.
pub async fn convert(
    State(state): State<AppState>,
    headers: HeaderMap,
    request_body: Body,
) -> Result<Response, RenderError> {
    let start = Instant::now();
    let bytes = body::read_body(request_body, state.config.max_body_bytes).await?;
    let request = validate::parse_request(&bytes)?;
    let output = state.invoker.convert(&request).await?;

    info!(
        "Converted to {} ({} bytes) in {}ms",
        request.target_format,
        output.len(),
        start.elapsed().as_millis()
    );
    Ok(respond::compose(output, request.target_format, &headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn version_reports_identity() {
        let Json(body) = version().await;
        assert_eq!(body, json!({ "pandoc": "renderer" }));
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = not_found().await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not found");
    }
}
