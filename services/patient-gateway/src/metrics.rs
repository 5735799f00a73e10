// Prometheus Metrics for the Patient Gateway
// Tracks: REST throughput, latency and outcomes. Transaction and subscription
// metrics live in the default registry and are exported alongside.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_with_registry, Encoder, HistogramOpts, HistogramVec, IntCounterVec,
    IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

pub struct Metrics {
    pub registry: Registry,

    // Request metrics
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = register_int_counter_vec_with_registry!(
            Opts::new(
                "patient_gateway_http_requests_total",
                "Total patient REST requests processed"
            ),
            &["method", "status"],
            registry
        )?;

        let http_request_duration_seconds = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "patient_gateway_http_request_duration_seconds",
                "Patient REST request duration in seconds"
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["method"],
            registry
        )?;

        let http_requests_in_flight = register_int_gauge_with_registry!(
            Opts::new(
                "patient_gateway_http_requests_in_flight",
                "Patient REST requests currently awaiting the ledger"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        })
    }

    /// Record a completed request
    pub fn track_request(&self, method: &str, status: u16, seconds: f64) {
        self.http_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method])
            .observe(seconds);
    }

    /// Export gateway metrics plus the default registry in Prometheus text format
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut metric_families = self.registry.gather();
        metric_families.extend(prometheus::gather());

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

// Global metrics instance
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));
