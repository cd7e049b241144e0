//! HTTP server for the greeting and metrics endpoints
//!
//! - `/metrics` - Prometheus scrape (cluster-aware mode)
//! - any other path - Greeting with the configured version

mod http;
mod metrics;

pub use http::{bind, greeting_body, router, serve, AppState};
pub use metrics::{create_metrics, AppMetrics, SharedMetrics};

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_tests;
