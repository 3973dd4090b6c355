//! Conversion invoker: run the engine as a child process for one request.
//!
//! ## Process lifecycle
//!
//! ```text
//! spawn ──▶ ┌ write source to stdin, then close it ┐
//!           ├ drain stdout                          ├──▶ wait ──▶ exit status
//!           └ drain stderr                          ┘
//!      └──────────── one timeout covers all of it ─────────────┘
//! ```
//!
//! The three pipe operations run concurrently. Writing stdin to completion
//! before reading anything would deadlock as soon as the engine fills its
//! stdout pipe buffer while we are still blocked writing to it.
//!
//! The whole run is a single future wrapped in [`tokio::time::timeout`].
//! When the deadline passes that future is dropped and the child gets
//! SIGKILL, then is reaped. The child is also spawned with `kill_on_drop`,
//! so a request abandoned mid-flight never leaves an engine running.

use crate::config::{EngineCommand, ServerConfig};
use crate::error::RenderError;
use crate::format::TargetFormat;
use crate::pipeline::validate::ConversionRequest;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info, warn};

/// Engine flags for a request: read Markdown on stdin, write `to` on stdout.
///
/// `--standalone` and `--embed-resources` are html-only and are never passed
/// for other formats, whatever the request says.
pub fn engine_args(request: &ConversionRequest) -> Vec<&'static str> {
    let mut args = vec![
        "--from",
        "markdown",
        "--to",
        request.target_format.as_str(),
        "--output",
        "-",
    ];
    if request.target_format == TargetFormat::Html {
        if request.standalone {
            args.push("--standalone");
        }
        if request.embed_resources {
            args.push("--embed-resources");
        }
    }
    args
}

/// Runs conversions against one engine command with one timeout.
///
/// Holds no per-request state; every [`Invoker::convert`] call owns its own
/// child process, buffers and timer.
#[derive(Debug, Clone)]
pub struct Invoker {
    engine: EngineCommand,
    timeout: Duration,
}

impl Invoker {
    pub fn new(engine: EngineCommand, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.engine.clone(), config.engine_timeout)
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Convert `request`, returning the engine's stdout on a zero exit.
    ///
    /// # Errors
    /// - [`RenderError::SpawnError`] if the engine cannot be started
    /// - [`RenderError::ConversionFailed`] on a non-zero exit, a kill after
    ///   the timeout, or a pipe failure; the message is the engine's trimmed
    ///   stderr, or an "exited with code/signal" line when stderr is empty
    pub async fn convert(&self, request: &ConversionRequest) -> Result<Vec<u8>, RenderError> {
        let start = Instant::now();
        let program = self.engine.display_name();
        let args = engine_args(request);
        info!(
            "Converting {} bytes of Markdown to {}",
            request.source_text.len(),
            request.target_format
        );
        debug!("Spawning {} {:?} {:?}", program, self.engine.args, args);

        let mut child = Command::new(&self.engine.program)
            .args(&self.engine.args)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::SpawnError {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        let (Some(stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            reap(&mut child).await;
            return Err(RenderError::SpawnError {
                program,
                reason: "child stdio was not captured".into(),
            });
        };

        // Buffers live outside the timed future so output read before a
        // timeout is still available for the error message.
        let mut out = Vec::new();
        let mut err = Vec::new();
        let run = async {
            tokio::try_join!(
                feed_stdin(stdin, request.source_text.as_bytes()),
                stdout.read_to_end(&mut out),
                stderr.read_to_end(&mut err),
            )?;
            child.wait().await
        };
        let outcome = tokio::time::timeout(self.timeout, run).await;
        let timed_out = outcome.is_err();

        let status = match outcome {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                reap(&mut child).await;
                return Err(RenderError::ConversionFailed(format!(
                    "{program} I/O error: {e}"
                )));
            }
            Err(_) => {
                warn!(
                    "{} did not finish within {:?}; killing it",
                    program, self.timeout
                );
                reap(&mut child).await
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match status {
            Some(status) if status.success() && !timed_out => {
                info!(
                    "{} produced {} bytes of {} in {}ms",
                    program,
                    out.len(),
                    request.target_format,
                    elapsed_ms
                );
                Ok(out)
            }
            status => {
                let diagnostics = String::from_utf8_lossy(&err);
                let diagnostics = diagnostics.trim();
                let message = if diagnostics.is_empty() {
                    exit_message(&program, status)
                } else {
                    diagnostics.to_string()
                };
                warn!("{} failed after {}ms: {}", program, elapsed_ms, message);
                Err(RenderError::ConversionFailed(message))
            }
        }
    }
}

/// Write the whole source to the engine, then close its stdin.
///
/// An engine that exits without reading its input breaks the pipe; that is
/// not a failure by itself, the exit status decides.
async fn feed_stdin(mut stdin: ChildStdin, input: &[u8]) -> io::Result<()> {
    match stdin.write_all(input).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Engine closed stdin before reading all input");
            return Ok(());
        }
        Err(e) => return Err(e),
    }
    // Dropping the handle closes the pipe and signals end of input.
    drop(stdin);
    Ok(())
}

/// SIGKILL the child (if still running) and wait for it.
async fn reap(child: &mut Child) -> Option<ExitStatus> {
    if let Err(e) = child.kill().await {
        debug!("kill: {}", e);
    }
    child.try_wait().ok().flatten()
}

fn exit_message(program: &str, status: Option<ExitStatus>) -> String {
    let Some(status) = status else {
        return format!("{program} exited abnormally");
    };
    if let Some(code) = status.code() {
        return format!("{program} exited with code {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("{program} exited with signal {signal}");
        }
    }
    format!("{program} exited abnormally")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: TargetFormat, standalone: bool, embed: bool) -> ConversionRequest {
        ConversionRequest {
            standalone,
            embed_resources: embed,
            ..ConversionRequest::new("# Hi", format)
        }
    }

    #[test]
    fn base_args_read_markdown_from_stdin() {
        let args = engine_args(&request(TargetFormat::Docx, false, false));
        assert_eq!(args, ["--from", "markdown", "--to", "docx", "--output", "-"]);
    }

    #[test]
    fn html_flags_follow_request() {
        let args = engine_args(&request(TargetFormat::Html, true, false));
        assert_eq!(args.last(), Some(&"--standalone"));
        assert!(!args.contains(&"--embed-resources"));

        let args = engine_args(&request(TargetFormat::Html, true, true));
        assert!(args.ends_with(&["--standalone", "--embed-resources"]));
    }

    #[test]
    fn html_flags_never_reach_other_formats() {
        for format in [TargetFormat::Docx, TargetFormat::Pptx] {
            let args = engine_args(&request(format, true, true));
            assert!(!args.contains(&"--standalone"), "{format}: {args:?}");
            assert!(!args.contains(&"--embed-resources"), "{format}: {args:?}");
        }
    }

    #[tokio::test]
    async fn missing_engine_is_spawn_error() {
        let invoker = Invoker::new(
            EngineCommand::new("/nonexistent/pandoc-renderer-test-engine"),
            Duration::from_secs(5),
        );
        let err = invoker
            .convert(&request(TargetFormat::Html, false, false))
            .await
            .unwrap_err();
        match err {
            RenderError::SpawnError { program, .. } => {
                assert!(program.ends_with("pandoc-renderer-test-engine"))
            }
            other => panic!("expected SpawnError, got {other:?}"),
        }
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        fn sh(script: &str) -> EngineCommand {
            EngineCommand::new("sh").arg("-c").arg(script).arg("sh")
        }

        fn invoker(script: &str, timeout: Duration) -> Invoker {
            Invoker::new(sh(script), timeout)
        }

        #[tokio::test]
        async fn echoes_stdin_to_stdout() {
            let out = invoker("cat", Duration::from_secs(10))
                .convert(&request(TargetFormat::Html, false, false))
                .await
                .unwrap();
            assert_eq!(out, b"# Hi");
        }

        #[tokio::test]
        async fn receives_conversion_flags() {
            let out = invoker(r#"cat >/dev/null; printf '%s\n' "$@""#, Duration::from_secs(10))
                .convert(&request(TargetFormat::Html, true, true))
                .await
                .unwrap();
            let text = String::from_utf8(out).unwrap();
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(
                lines,
                [
                    "--from",
                    "markdown",
                    "--to",
                    "html",
                    "--output",
                    "-",
                    "--standalone",
                    "--embed-resources"
                ]
            );
        }

        #[tokio::test]
        async fn large_output_does_not_deadlock() {
            // 1 MiB of input echoed back: far beyond any pipe buffer.
            let req = ConversionRequest::new("x".repeat(1024 * 1024), TargetFormat::Html);
            let out = invoker("cat", Duration::from_secs(30))
                .convert(&req)
                .await
                .unwrap();
            assert_eq!(out.len(), 1024 * 1024);
        }

        #[tokio::test]
        async fn non_zero_exit_reports_stderr() {
            let err = invoker("echo '  boom  ' >&2; exit 1", Duration::from_secs(10))
                .convert(&request(TargetFormat::Docx, false, false))
                .await
                .unwrap_err();
            match err {
                RenderError::ConversionFailed(msg) => assert_eq!(msg, "boom"),
                other => panic!("expected ConversionFailed, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn silent_failure_reports_exit_code() {
            let err = invoker("cat >/dev/null; exit 3", Duration::from_secs(10))
                .convert(&request(TargetFormat::Docx, false, false))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "sh exited with code 3");
        }

        #[tokio::test]
        async fn hung_engine_is_killed_at_timeout() {
            let start = Instant::now();
            let err = invoker("exec sleep 30", Duration::from_millis(200))
                .convert(&request(TargetFormat::Html, false, false))
                .await
                .unwrap_err();
            assert!(start.elapsed() < Duration::from_secs(10));
            match err {
                RenderError::ConversionFailed(msg) => {
                    assert_eq!(msg, "sh exited with signal 9")
                }
                other => panic!("expected ConversionFailed, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn engine_ignoring_stdin_still_succeeds() {
            let req = ConversionRequest::new("y".repeat(512 * 1024), TargetFormat::Html);
            let out = invoker("printf ok", Duration::from_secs(10))
                .convert(&req)
                .await
                .unwrap();
            assert_eq!(out, b"ok");
        }
    }
}
