//! Tracing, logging, metrics (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Purchase attempt observer contract and its tracing-backed implementation.
pub mod hook;

/// Prometheus purchase metrics.
pub mod metrics;

pub use hook::{
    AttemptHandle, NoopObserver, ObserverError, OutcomeAttributes, PurchaseObserver,
    TracingPurchaseObserver,
};
pub use metrics::{exposition_content_type, PurchaseMetrics};
