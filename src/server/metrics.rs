//! Prometheus metrics for hello-app
//!
//! Each `AppMetrics` owns its registry, so nothing is registered globally:
//! - Pod status gauge (registered and scraped, never set)
//! - Poll cycle outcomes

use prometheus::{self, Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Service metrics registry
///
/// Thread-safe container for all Prometheus metrics.
#[derive(Clone)]
pub struct AppMetrics {
    registry: Registry,
    /// Status of the hello-app pod (1 = running, 0 = not running)
    pub pod_status: Gauge,
    /// Completed poll cycles by result (success, error)
    pub poll_cycles_total: IntCounterVec,
}

impl AppMetrics {
    /// Create a new registry with all hello-app metrics
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let pod_status = Gauge::with_opts(Opts::new(
            "hello_app_pod_status",
            "Status of the hello-app pod (1 = running, 0 = not running)",
        ))?;
        registry.register(Box::new(pod_status.clone()))?;

        let poll_cycles_total = IntCounterVec::new(
            Opts::new(
                "hello_app_poll_cycles_total",
                "Total number of pod status poll cycles",
            ),
            &["result"], // success, error
        )?;
        registry.register(Box::new(poll_cycles_total.clone()))?;

        Ok(Self {
            registry,
            pod_status,
            poll_cycles_total,
        })
    }

    /// Record a poll cycle that listed pods successfully
    pub fn record_poll_success(&self) {
        self.poll_cycles_total.with_label_values(&["success"]).inc();
    }

    /// Record a poll cycle whose pod listing failed
    pub fn record_poll_error(&self) {
        self.poll_cycles_total.with_label_values(&["error"]).inc();
    }

    /// Encode all metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
        })
    }
}

/// Shared metrics handle
pub type SharedMetrics = Arc<AppMetrics>;

/// Create a new shared metrics instance
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(AppMetrics::new()?))
}
