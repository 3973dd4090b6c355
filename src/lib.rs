//! # pandoc-renderer
//!
//! A single-endpoint HTTP gateway that converts Markdown to `docx`, `pptx`
//! or `html` by running pandoc as a child process.
//!
//! ## Request Pipeline
//!
//! ```text
//! POST /
//!  │
//!  ├─ 1. Body      collect the body under a 2 MiB cap          → 413
//!  ├─ 2. Validate  JSON with `text`, `to`, optional html flags → 400
//!  ├─ 3. Invoke    pandoc on stdin/stdout, killed after 60 s   → 500
//!  └─ 4. Respond   raw bytes, or a JSON envelope on Accept: application/json
//! ```
//!
//! `GET /health` and `GET /version` return fixed JSON; everything else is a
//! plain-text 404.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pandoc_renderer::{server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().port(3030).build()?;
//!     server::run(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Wire format
//!
//! ```text
//! POST / {"text": "# Hi", "to": "html", "standalone": false, "embed-resources": false}
//!
//! 200  <h1 id="hi">Hi</h1>                       content-type: text/html
//! 200  {"output": "...", "base64": false,        with Accept: application/json
//!       "contentType": "text/html"}
//! 4xx/5xx  {"error": "..."}
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pandoc-renderer` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod format;
pub mod handlers;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EngineCommand, ServerConfig, ServerConfigBuilder};
pub use error::RenderError;
pub use format::TargetFormat;
pub use pipeline::invoke::Invoker;
pub use pipeline::respond::Envelope;
pub use pipeline::validate::ConversionRequest;
pub use server::{build_router, AppState};
