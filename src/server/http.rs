//! HTTP endpoints
//!
//! - `/metrics` - Prometheus scrape (cluster-aware mode only, any method)
//! - everything else - greeting with the configured version

use super::metrics::SharedMetrics;
use crate::config::Configuration;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<Configuration>,
    metrics: Option<SharedMetrics>,
}

impl AppState {
    /// State for the basic variant: greeting only
    pub fn new(config: Configuration) -> Self {
        Self {
            config: Arc::new(config),
            metrics: None,
        }
    }

    /// Expose `metrics` on `/metrics`
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Render the greeting body for a version
pub fn greeting_body(version: &str) -> String {
    format!("hello-app says hi! [version: {}]\n", version)
}

/// Greeting handler
///
/// Serves every method and path that is not otherwise routed.
async fn greeting(State(config): State<Arc<Configuration>>) -> String {
    greeting_body(&config.version)
}

/// Prometheus scrape handler
///
/// Returns 500 if the registry cannot be encoded.
async fn scrape(State(metrics): State<SharedMetrics>) -> Response {
    match metrics.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the router for the given state
///
/// `/metrics` is only routed when the state carries metrics.
pub fn router(state: AppState) -> Router {
    let greeting_app: Router = Router::new().fallback(greeting).with_state(state.config);

    match state.metrics {
        Some(metrics) => Router::new()
            .route("/metrics", any(scrape))
            .with_state(metrics)
            .merge(greeting_app),
        None => greeting_app,
    }
}

/// Bind the HTTP listener on all interfaces
pub async fn bind(port: u16) -> Result<TcpListener, std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    // Log after successful bind - server is actually listening
    info!(port = listener.local_addr()?.port(), "HTTP server listening");
    Ok(listener)
}

/// Serve requests on `listener`
///
/// # Returns
/// This function runs forever until the server is shut down
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state))
        .await
        .map_err(std::io::Error::other)
}
