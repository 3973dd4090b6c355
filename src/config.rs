//! Configuration types for the conversion gateway.
//!
//! All server behaviour is controlled through [`ServerConfig`], built via its
//! [`ServerConfigBuilder`]. The byte cap, the engine timeout and the engine
//! command are plain fields rather than process-wide constants, so tests can
//! run a server with a 10-byte cap or a 200 ms timeout next to a production
//! one.

use crate::error::RenderError;
use std::ffi::OsString;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3030;

/// Default request body cap: 2 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Default wall-clock limit for one engine run.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(60);

/// The executable used to convert documents.
///
/// `args` are placed before the conversion flags, so a wrapper such as
/// `sh -c '<script>' sh` receives the flags as `$1..$n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl EngineCommand {
    /// Run `program` with no leading arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a leading argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Program name for log lines and error messages.
    pub fn display_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl Default for EngineCommand {
    fn default() -> Self {
        Self::new("pandoc")
    }
}

/// Configuration for one gateway instance.
///
/// # Example
/// ```rust
/// use pandoc_renderer::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::builder()
///     .port(8080)
///     .max_body_bytes(64 * 1024)
///     .engine_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,

    /// TCP port. Default: 3030.
    pub port: u16,

    /// Largest accepted request body in bytes. Default: 2 MiB.
    pub max_body_bytes: usize,

    /// Time an engine run may take before it is killed. Default: 60 s.
    pub engine_timeout: Duration,

    /// Engine executable. Default: `pandoc` from `PATH`.
    pub engine: EngineCommand,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            engine_timeout: DEFAULT_ENGINE_TIMEOUT,
            engine: EngineCommand::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Socket address assembled from `host` and `port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, RenderError> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            RenderError::InvalidConfig(format!("host must be an IP address, got '{}'", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn max_body_bytes(mut self, n: usize) -> Self {
        self.config.max_body_bytes = n;
        self
    }

    pub fn engine_timeout(mut self, timeout: Duration) -> Self {
        self.config.engine_timeout = timeout;
        self
    }

    pub fn engine(mut self, engine: EngineCommand) -> Self {
        self.config.engine = engine;
        self
    }

    /// Shorthand for an engine with no leading arguments.
    pub fn engine_program(mut self, program: impl Into<OsString>) -> Self {
        self.config.engine = EngineCommand::new(program);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, RenderError> {
        let c = &self.config;
        if c.max_body_bytes == 0 {
            return Err(RenderError::InvalidConfig(
                "max_body_bytes must be ≥ 1".into(),
            ));
        }
        if c.engine_timeout.is_zero() {
            return Err(RenderError::InvalidConfig(
                "engine_timeout must be greater than zero".into(),
            ));
        }
        if c.engine.program.to_string_lossy().trim().is_empty() {
            return Err(RenderError::InvalidConfig(
                "engine program must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
