//! Body reader: collect a request body under a hard byte cap.
//!
//! The body is the only attacker-sized input the gateway touches, so the cap
//! is checked frame by frame as data arrives. The first frame that would push
//! the total past the limit ends the read; the rest of the stream is dropped
//! unread and never buffered.

use crate::error::RenderError;
use axum::body::{Body, HttpBody as _};
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use tracing::{debug, warn};

/// Read `body` to completion, failing once more than `limit` bytes arrive.
///
/// A body whose declared length already exceeds `limit` is rejected before
/// any frame is polled.
pub async fn read_body(mut body: Body, limit: usize) -> Result<Bytes, RenderError> {
    let declared = body.size_hint().lower();
    if declared > limit as u64 {
        warn!("Rejecting body: declared {} bytes, limit {}", declared, limit);
        return Err(RenderError::PayloadTooLarge { limit });
    }

    let mut buf = BytesMut::new();
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| RenderError::TransportError(e.to_string()))?;
        // Trailers carry no payload.
        let Ok(data) = frame.into_data() else {
            continue;
        };
        if buf.len() + data.len() > limit {
            warn!(
                "Rejecting body: {} bytes exceeds limit {}",
                buf.len() + data.len(),
                limit
            );
            return Err(RenderError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&data);
    }

    debug!("Read request body: {} bytes", buf.len());
    Ok(buf.freeze())
}
