//! Observer contract for purchase attempts.
//!
//! The purchase engine depends on [`PurchaseObserver`] abstractly; the process
//! wires in [`TracingPurchaseObserver`], tests wire in recorders.
//!
//! Contract:
//! - `begin_attempt` once when an attempt starts
//! - `record_outcome` once with the terminal status
//! - `end_attempt` exactly once, on every path (the handle is consumed)
//!
//! Observer failures are reported back as `ObserverError` and must never
//! change the purchase outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use storefront_core::{AttemptId, ItemId};
use storefront_inventory::PurchaseStatus;

use crate::metrics::PurchaseMetrics;

/// Opaque per-attempt handle handed out by [`PurchaseObserver::begin_attempt`].
#[derive(Debug)]
pub struct AttemptHandle {
    attempt_id: AttemptId,
    item_id: ItemId,
    started_at: Instant,
}

impl AttemptHandle {
    pub fn new(attempt_id: AttemptId, item_id: ItemId) -> Self {
        Self {
            attempt_id,
            item_id,
            started_at: Instant::now(),
        }
    }

    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Extra attributes attached to an outcome record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeAttributes {
    /// Present only on `Purchased`.
    pub brand: Option<String>,
    /// Store error text on `TransactionFailed`.
    pub failure_reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("observer sink unavailable: {0}")]
    Sink(String),
}

pub trait PurchaseObserver: Send + Sync {
    fn begin_attempt(&self, item_id: ItemId) -> AttemptHandle;

    fn record_outcome(
        &self,
        handle: &AttemptHandle,
        status: PurchaseStatus,
        attributes: &OutcomeAttributes,
    ) -> Result<(), ObserverError>;

    fn end_attempt(&self, handle: AttemptHandle);
}

impl<O> PurchaseObserver for Arc<O>
where
    O: PurchaseObserver + ?Sized,
{
    fn begin_attempt(&self, item_id: ItemId) -> AttemptHandle {
        (**self).begin_attempt(item_id)
    }

    fn record_outcome(
        &self,
        handle: &AttemptHandle,
        status: PurchaseStatus,
        attributes: &OutcomeAttributes,
    ) -> Result<(), ObserverError> {
        (**self).record_outcome(handle, status, attributes)
    }

    fn end_attempt(&self, handle: AttemptHandle) {
        (**self).end_attempt(handle)
    }
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PurchaseObserver for NoopObserver {
    fn begin_attempt(&self, item_id: ItemId) -> AttemptHandle {
        AttemptHandle::new(AttemptId::new(), item_id)
    }

    fn record_outcome(
        &self,
        _handle: &AttemptHandle,
        _status: PurchaseStatus,
        _attributes: &OutcomeAttributes,
    ) -> Result<(), ObserverError> {
        Ok(())
    }

    fn end_attempt(&self, _handle: AttemptHandle) {}
}

/// Emits one structured log event per outcome and feeds [`PurchaseMetrics`].
#[derive(Debug, Clone)]
pub struct TracingPurchaseObserver {
    metrics: Arc<PurchaseMetrics>,
}

impl TracingPurchaseObserver {
    pub fn new(metrics: Arc<PurchaseMetrics>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &Arc<PurchaseMetrics> {
        &self.metrics
    }
}

impl PurchaseObserver for TracingPurchaseObserver {
    fn begin_attempt(&self, item_id: ItemId) -> AttemptHandle {
        let handle = AttemptHandle::new(AttemptId::new(), item_id);
        self.metrics.attempt_started();
        ::tracing::debug!(
            attempt_id = %handle.attempt_id,
            item_id = %item_id,
            "purchase attempt started"
        );
        handle
    }

    fn record_outcome(
        &self,
        handle: &AttemptHandle,
        status: PurchaseStatus,
        attributes: &OutcomeAttributes,
    ) -> Result<(), ObserverError> {
        self.metrics.record_outcome(status, handle.elapsed());

        match status {
            PurchaseStatus::Purchased => ::tracing::info!(
                attempt_id = %handle.attempt_id,
                item_id = %handle.item_id,
                purchase.success = true,
                item.brand = attributes.brand.as_deref().unwrap_or_default(),
                "purchase saved"
            ),
            PurchaseStatus::TransactionFailed => ::tracing::warn!(
                attempt_id = %handle.attempt_id,
                item_id = %handle.item_id,
                purchase.success = false,
                purchase.status = status.as_str(),
                error = attributes.failure_reason.as_deref().unwrap_or_default(),
                "purchase transaction failed"
            ),
            _ => ::tracing::info!(
                attempt_id = %handle.attempt_id,
                item_id = %handle.item_id,
                purchase.success = false,
                purchase.status = status.as_str(),
                "purchase rejected"
            ),
        }
        Ok(())
    }

    fn end_attempt(&self, handle: AttemptHandle) {
        let elapsed = handle.elapsed();
        self.metrics.attempt_finished();
        ::tracing::debug!(
            attempt_id = %handle.attempt_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "purchase attempt ended"
        );
    }
}
