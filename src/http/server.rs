//! Demo HTTP server wrapped by the access log middleware.
//!
//! # Responsibilities
//! - Create an Axum Router with a handful of sample handlers
//! - Wire up middleware (timeout, access log)
//! - Serve with connection info so `:remoteAddr` has a peer address
//! - Flush buffered access lines on graceful shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;

use crate::config::AppConfig;
use crate::http::AccessLogLayer;

/// Small HTTP server used to exercise the middleware.
pub struct DemoServer {
    router: Router,
    access_log: AccessLogLayer,
}

impl DemoServer {
    pub fn new(config: &AppConfig, access_log: AccessLogLayer) -> Self {
        let router = Self::build_router(config, access_log.clone());
        Self { router, access_log }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, access_log: AccessLogLayer) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/status/{code}", any(status))
            .route("/echo/{*path}", any(echo))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(access_log)
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until a shutdown signal arrives on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        self.access_log.flush();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn index() -> impl IntoResponse {
    ([("x-sent", "true")], "hello\n")
}

async fn health() -> &'static str {
    "ok"
}

/// Respond with the requested status; 5xx bodies carry a fake stack trace.
async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    let body = if status.is_server_error() {
        format!("Error: status {} requested\n    at status (src/http/server.rs)\n", code)
    } else {
        format!("{}\n", status)
    };
    (status, [(header::CONTENT_TYPE, "text/plain")], body)
}

async fn echo(Path(path): Path<String>) -> String {
    format!("/{}\n", path)
}

/// Wait for Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
