//! Prometheus metrics for purchase attempts.
//!
//! Each [`PurchaseMetrics`] owns its registry, so tests and embedded servers
//! never share counters through a process global.

use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use storefront_inventory::PurchaseStatus;

#[derive(Debug, Clone)]
pub struct PurchaseMetrics {
    registry: Registry,
    outcomes_total: IntCounterVec,
    attempt_duration_seconds: HistogramVec,
    attempts_in_flight: IntGauge,
}

impl PurchaseMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let outcomes_total = IntCounterVec::new(
            Opts::new(
                "storefront_purchase_outcomes_total",
                "Purchase attempts partitioned by terminal status.",
            ),
            &["status"],
        )?;

        let attempt_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "storefront_purchase_attempt_duration_seconds",
                "Purchase attempt duration in seconds partitioned by terminal status.",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["status"],
        )?;

        let attempts_in_flight = IntGauge::new(
            "storefront_purchase_attempts_in_flight",
            "Purchase attempts currently executing.",
        )?;

        registry.register(Box::new(outcomes_total.clone()))?;
        registry.register(Box::new(attempt_duration_seconds.clone()))?;
        registry.register(Box::new(attempts_in_flight.clone()))?;

        // Expose every status from the first scrape, not only after it occurs.
        for status in PurchaseStatus::ALL {
            outcomes_total.with_label_values(&[status.as_str()]);
        }

        Ok(Self {
            registry,
            outcomes_total,
            attempt_duration_seconds,
            attempts_in_flight,
        })
    }

    pub fn attempt_started(&self) {
        self.attempts_in_flight.inc();
    }

    pub fn record_outcome(&self, status: PurchaseStatus, elapsed: Duration) {
        self.outcomes_total.with_label_values(&[status.as_str()]).inc();
        self.attempt_duration_seconds
            .with_label_values(&[status.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    pub fn attempt_finished(&self) {
        self.attempts_in_flight.dec();
    }

    pub fn outcome_count(&self, status: PurchaseStatus) -> u64 {
        self.outcomes_total.with_label_values(&[status.as_str()]).get()
    }

    pub fn in_flight(&self) -> i64 {
        self.attempts_in_flight.get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of every registered metric.
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Content type of [`PurchaseMetrics::encode`] output.
pub fn exposition_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}
