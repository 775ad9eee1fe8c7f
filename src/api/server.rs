//! HTTP server lifecycle: bind, serve the API router, shut down.
//!
//! bind → spawn background task → return handle with shutdown channel.
//! [`serve`] wraps that for the binary and blocks until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::router::api_router;
use crate::config::ServerConfig;
use crate::core_state::{CoreError, CoreState};
use crate::identity::{self, IdentityError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Startup failed: {0}")]
    Core(#[from] CoreError),
    #[error("Bootstrap administrator: {0}")]
    Bootstrap(#[from] IdentityError),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Handle to a running server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl ApiServer {
    /// Signal graceful shutdown and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
        let _ = (&mut self.task).await;
    }
}

/// Router plus the cross-cutting HTTP layers. The booking form may be served
/// from another origin, so CORS is open.
fn app(core: Arc<CoreState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    api_router(core)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors)
}

/// Prepares storage and the bootstrap login, binds `addr` and spawns the
/// server in a background tokio task.
pub async fn start_server(core: Arc<CoreState>, addr: SocketAddr) -> Result<ApiServer, ServerError> {
    core.initialize()?;
    if let Some(admin) = &core.config.bootstrap_admin {
        let conn = core.open_db()?;
        identity::ensure_bootstrap_admin(&conn, &admin.email, &admin.password)?;
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { addr, source })?;

    let app = app(core.clone());
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");
        // Peer addresses key the rate limiter for anonymous callers
        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, service)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        // Persist whatever the audit buffer still holds
        match core.flush_and_prune_audit() {
            Ok(flushed) => tracing::info!(flushed, "Audit trail flushed"),
            Err(e) => tracing::error!("Audit flush on shutdown failed: {e}"),
        }
        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

/// Runs the server from `config` until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let bind_addr = config.bind_addr;
    let core = Arc::new(CoreState::new(config));
    let server = start_server(core, bind_addr).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {e}");
    }
    server.shutdown().await;
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
