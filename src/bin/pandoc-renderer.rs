//! CLI binary for pandoc-renderer.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ServerConfig`, sets up logging and runs the server.

use anyhow::{Context, Result};
use clap::Parser;
use pandoc_renderer::{server, EngineCommand, ServerConfig};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r##"EXAMPLES:
  pandoc-renderer
  PORT=8080 pandoc-renderer --pandoc /opt/pandoc/bin/pandoc
  pandoc-renderer --timeout-secs 20 --max-body-bytes 524288 --log-json

  curl -s localhost:3030 -d '{"text":"# Hi","to":"html"}'
  curl -s localhost:3030 -H 'Accept: application/json' -d '{"text":"# Hi","to":"docx"}'

ENDPOINTS:
  POST /          convert {"text", "to": docx|pptx|html, "standalone"?, "embed-resources"?}
  GET  /health    {"status":"ok"}
  GET  /version   {"pandoc":"renderer"}

LOGGING:
  RUST_LOG overrides --verbose/--quiet, e.g. RUST_LOG=pandoc_renderer=debug,tower_http=debug
"##;

/// Markdown conversion gateway backed by pandoc.
#[derive(Parser, Debug)]
#[command(
    name = "pandoc-renderer",
    version,
    about = "HTTP gateway that converts Markdown to docx, pptx or html with pandoc",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 3030)]
    port: u16,

    /// Path to the pandoc executable.
    #[arg(long, env = "PANDOC_PATH", default_value = "pandoc")]
    pandoc: PathBuf,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "RENDERER_MAX_BODY_BYTES", default_value_t = 2 * 1024 * 1024,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_body_bytes: u64,

    /// Seconds a conversion may run before pandoc is killed.
    #[arg(long, env = "RENDERER_TIMEOUT_SECS", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Emit logs as JSON lines.
    #[arg(long, env = "RENDERER_LOG_JSON")]
    log_json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RENDERER_VERBOSE")]
    verbose: bool,

    /// Log errors only.
    #[arg(short, long, env = "RENDERER_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    info!(version = env!("CARGO_PKG_VERSION"), "pandoc-renderer starting");

    // ── Serve ────────────────────────────────────────────────────────────
    server::run(config).await.context("Server failed")?;
    Ok(())
}

/// Map CLI args to `ServerConfig`.
fn build_config(cli: &Cli) -> Result<ServerConfig> {
    let max_body_bytes = usize::try_from(cli.max_body_bytes)
        .context("--max-body-bytes does not fit in memory on this platform")?;

    ServerConfig::builder()
        .host(cli.host.clone())
        .port(cli.port)
        .max_body_bytes(max_body_bytes)
        .engine_timeout(Duration::from_secs(cli.timeout_secs))
        .engine(EngineCommand::new(cli.pandoc.clone()))
        .build()
        .context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    fn env_unset(name: &str) -> bool {
        std::env::var_os(name).is_none()
    }

    #[test]
    fn defaults_match_library_defaults() {
        let cli = Cli::try_parse_from(["pandoc-renderer"]).unwrap();
        let config = build_config(&cli).unwrap();
        let defaults = ServerConfig::default();
        // Exported env vars win over clap defaults; only compare the rest.
        if env_unset("RENDERER_MAX_BODY_BYTES") {
            assert_eq!(config.max_body_bytes, defaults.max_body_bytes);
        }
        if env_unset("RENDERER_TIMEOUT_SECS") {
            assert_eq!(config.engine_timeout, defaults.engine_timeout);
        }
        if env_unset("PANDOC_PATH") {
            assert_eq!(config.engine, defaults.engine);
        }
    }

    #[test]
    fn long_help_lists_examples_and_endpoints() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("EXAMPLES:"), "got: {help}");
        assert!(help.contains(r##"'{"text":"# Hi","to":"html"}'"##), "got: {help}");
        assert!(help.contains("/health"), "got: {help}");
        assert!(help.contains("RUST_LOG"), "got: {help}");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "pandoc-renderer",
            "--port",
            "8080",
            "--pandoc",
            "/usr/local/bin/pandoc",
            "--timeout-secs",
            "5",
            "--max-body-bytes",
            "10",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.engine_timeout, Duration::from_secs(5));
        assert_eq!(config.max_body_bytes, 10);
        assert_eq!(config.engine.display_name(), "/usr/local/bin/pandoc");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["pandoc-renderer", "--timeout-secs", "0"]).is_err());
    }
}
