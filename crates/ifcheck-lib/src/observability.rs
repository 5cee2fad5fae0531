//! Observability infrastructure for the check engine
//!
//! Provides:
//! - Prometheus metrics (evaluation latency, item outcomes, discovered services)
//! - Structured JSON logging with tracing

use crate::models::State;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for per-item evaluation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    evaluation_latency_seconds: Histogram,
    items_evaluated: IntCounter,
    items_pending: IntCounter,
    items_failed: IntCounter,
    findings_by_state: IntCounterVec,
    services_discovered: IntGauge,
    interfaces_polled: IntGauge,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            evaluation_latency_seconds: register_histogram!(
                "ifcheck_evaluation_latency_seconds",
                "Time spent evaluating a single item",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register evaluation_latency_seconds"),

            items_evaluated: register_int_counter!(
                "ifcheck_items_evaluated_total",
                "Items that produced a finding"
            )
            .expect("Failed to register items_evaluated"),

            items_pending: register_int_counter!(
                "ifcheck_items_pending_total",
                "Items skipped while counters were being initialized"
            )
            .expect("Failed to register items_pending"),

            items_failed: register_int_counter!(
                "ifcheck_items_failed_total",
                "Items that could not be evaluated"
            )
            .expect("Failed to register items_failed"),

            findings_by_state: register_int_counter_vec!(
                "ifcheck_findings_total",
                "Findings by overall monitoring state",
                &["state"]
            )
            .expect("Failed to register findings_by_state"),

            services_discovered: register_int_gauge!(
                "ifcheck_services_discovered",
                "Services produced by the last discovery run"
            )
            .expect("Failed to register services_discovered"),

            interfaces_polled: register_int_gauge!(
                "ifcheck_interfaces_polled",
                "Interface rows in the last section"
            )
            .expect("Failed to register interfaces_polled"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_evaluation_latency(&self, duration_secs: f64) {
        self.inner().evaluation_latency_seconds.observe(duration_secs);
    }

    /// Count a finding and its overall state
    pub fn record_finding(&self, state: State) {
        self.inner().items_evaluated.inc();
        self.inner()
            .findings_by_state
            .with_label_values(&[state.as_str()])
            .inc();
    }

    pub fn inc_items_pending(&self) {
        self.inner().items_pending.inc();
    }

    pub fn inc_items_failed(&self) {
        self.inner().items_failed.inc();
    }

    pub fn set_services_discovered(&self, count: i64) {
        self.inner().services_discovered.set(count);
    }

    pub fn set_interfaces_polled(&self, count: i64) {
        self.inner().interfaces_polled.set(count);
    }

    /// Text exposition of everything in the default registry
    pub fn gather_text(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Structured logger for engine events
#[derive(Clone)]
pub struct StructuredLogger {
    host: String,
}

impl StructuredLogger {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn log_startup(&self, version: &str, fallback_speed: u64, max_concurrent_checks: usize) {
        info!(
            event = "engine_started",
            host = %self.host,
            engine_version = %version,
            fallback_speed = fallback_speed,
            max_concurrent_checks = max_concurrent_checks,
            "Interface check engine started"
        );
    }

    pub fn log_discovery(&self, interfaces: usize, services: usize) {
        info!(
            event = "discovery_completed",
            host = %self.host,
            interfaces = interfaces,
            services = services,
            "Discovery completed"
        );
    }

    pub fn log_finding(&self, item: &str, state: State, summary: &str) {
        match state {
            State::Ok => info!(
                event = "item_checked",
                host = %self.host,
                item = %item,
                state = %state,
                "Item checked"
            ),
            _ => warn!(
                event = "item_checked",
                host = %self.host,
                item = %item,
                state = %state,
                summary = %summary,
                "Item not OK"
            ),
        }
    }

    pub fn log_pending(&self, item: &str, reason: &str) {
        info!(
            event = "item_pending",
            host = %self.host,
            item = %item,
            reason = %reason,
            "Counters initialized, waiting for next cycle"
        );
    }

    pub fn log_failure(&self, item: &str, error: &str) {
        warn!(
            event = "item_failed",
            host = %self.host,
            item = %item,
            error = %error,
            "Item could not be evaluated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_metrics_creation() {
        let metrics = EngineMetrics::new();
        metrics.observe_evaluation_latency(0.0002);
        metrics.record_finding(State::Warn);
        metrics.inc_items_pending();
        metrics.inc_items_failed();
        metrics.set_services_discovered(3);
        metrics.set_interfaces_polled(6);

        let text = metrics.gather_text();
        assert!(text.contains("ifcheck_findings_total"));
        assert!(text.contains("state=\"WARN\""));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("router-1");
        assert_eq!(logger.host, "router-1");
        logger.log_startup("0.1.0", 100_000_000, 8);
        logger.log_finding("5", State::Crit, "Out: 3.20 MB/s");
    }
}
