//! HTTP server: router, shared state and the accept loop.

use crate::config::ServerConfig;
use crate::error::RenderError;
use crate::handlers;
use crate::pipeline::invoke::Invoker;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// State shared by all handlers. Read-only; nothing request-scoped lives here.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub invoker: Invoker,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let invoker = Invoker::from_config(&config);
        Self {
            config: Arc::new(config),
            invoker,
        }
    }
}

/// Build the router.
///
/// A known path hit with the wrong method gets the same 404 as an unknown
/// path. axum's own body limit is disabled: `POST /` enforces
/// `max_body_bytes` itself while streaming the body.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::convert).fallback(handlers::not_found))
        .route("/health", get(handlers::health).fallback(handlers::not_found))
        .route("/version", get(handlers::version).fallback(handlers::not_found))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, config: ServerConfig, shutdown: F) -> Result<(), RenderError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(AppState::new(config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(RenderError::Server)
}

/// Bind the configured address and serve until SIGINT or SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), RenderError> {
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RenderError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(
        "listening on :{} (engine: {}, timeout: {:?}, max body: {} bytes)",
        addr.port(),
        config.engine.display_name(),
        config.engine_timeout,
        config.max_body_bytes
    );

    serve(listener, config, shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; draining connections");
}
