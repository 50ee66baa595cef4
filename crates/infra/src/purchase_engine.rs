//! Purchase transaction engine.
//!
//! One purchase attempt walks a short state machine:
//!
//! ```text
//! Fetching ──▶ NotFound
//!    │   └───▶ OutOfStock (stock already zero, no write issued)
//!    ▼
//! Deciding ──▶ CommittingDecrement ──▶ Purchased | OutOfStock | NotFound | TransactionFailed
//! ```
//!
//! Stock safety does not depend on the fetch: the decrement is a conditional
//! write the store evaluates atomically, so a stale read can only cost a
//! round-trip, never oversell.

use std::time::Duration;

use tracing::{instrument, warn};

use storefront_core::ItemId;
use storefront_inventory::{PurchaseOutcome, PurchaseStage, PurchaseStatus};
use storefront_observability::{AttemptHandle, OutcomeAttributes, PurchaseObserver};

use crate::item_store::{with_timeout, ItemStore, ItemStoreError, DEFAULT_STORE_TIMEOUT};

/// Executes purchase attempts against an [`ItemStore`], reporting every
/// attempt to a [`PurchaseObserver`].
#[derive(Debug, Clone)]
pub struct PurchaseEngine<S, O> {
    store: S,
    observer: O,
    store_timeout: Duration,
}

impl<S, O> PurchaseEngine<S, O>
where
    S: ItemStore,
    O: PurchaseObserver,
{
    pub fn new(store: S, observer: O) -> Self {
        Self {
            store,
            observer,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Bound applied to each store round-trip.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Attempt to buy one unit of `item_id`.
    ///
    /// Never fails: business rejections and store failures are both ordinary
    /// [`PurchaseOutcome`] values.
    #[instrument(name = "process_purchase", skip_all, fields(item_id = %item_id))]
    pub async fn purchase(&self, item_id: ItemId) -> PurchaseOutcome {
        let mut guard = AttemptGuard::begin(&self.observer, item_id);
        let outcome = self.execute(item_id).await;
        guard.finish(&outcome);
        outcome
    }

    async fn execute(&self, item_id: ItemId) -> PurchaseOutcome {
        let mut stage = PurchaseStage::Fetching;
        tracing::trace!(stage = stage.as_str());

        let fetched =
            with_timeout(self.store_timeout, "get_item", self.store.get_item(item_id)).await;
        let item = match fetched {
            Ok(Some(item)) => item,
            Ok(None) => return PurchaseOutcome::NotFound,
            Err(e) => return failed(stage, e),
        };

        stage = PurchaseStage::Deciding;
        tracing::trace!(stage = stage.as_str(), stock = item.stock);
        if !item.is_in_stock() {
            return PurchaseOutcome::OutOfStock;
        }

        stage = PurchaseStage::CommittingDecrement;
        tracing::trace!(stage = stage.as_str());
        let committed = with_timeout(
            self.store_timeout,
            "conditional_decrement_stock",
            self.store.conditional_decrement_stock(item_id, 1),
        )
        .await;

        match committed {
            Ok(updated) => PurchaseOutcome::Purchased(updated),
            Err(ItemStoreError::ConditionNotMet { .. }) => PurchaseOutcome::OutOfStock,
            Err(ItemStoreError::NotFound(_)) => PurchaseOutcome::NotFound,
            Err(e) => failed(stage, e),
        }
    }
}

fn failed(stage: PurchaseStage, err: ItemStoreError) -> PurchaseOutcome {
    warn!(stage = stage.as_str(), error = %err, "store failure during purchase");
    PurchaseOutcome::transaction_failed(err.to_string())
}

/// Ties one observer attempt to a scope.
///
/// `end_attempt` runs exactly once from `Drop`. If the purchase future is
/// dropped before an outcome is known, the attempt is recorded as
/// `TransactionFailed`.
struct AttemptGuard<'a, O: PurchaseObserver> {
    observer: &'a O,
    handle: Option<AttemptHandle>,
    recorded: bool,
}

impl<'a, O: PurchaseObserver> AttemptGuard<'a, O> {
    fn begin(observer: &'a O, item_id: ItemId) -> Self {
        Self {
            observer,
            handle: Some(observer.begin_attempt(item_id)),
            recorded: false,
        }
    }

    fn finish(&mut self, outcome: &PurchaseOutcome) {
        let attributes = match outcome {
            PurchaseOutcome::Purchased(item) => OutcomeAttributes {
                brand: Some(item.brand.clone()),
                failure_reason: None,
            },
            PurchaseOutcome::TransactionFailed { reason } => OutcomeAttributes {
                brand: None,
                failure_reason: Some(reason.clone()),
            },
            _ => OutcomeAttributes::default(),
        };
        self.record(outcome.status(), &attributes);
    }

    fn record(&mut self, status: PurchaseStatus, attributes: &OutcomeAttributes) {
        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        self.recorded = true;
        if let Err(e) = self.observer.record_outcome(handle, status, attributes) {
            warn!(error = %e, "purchase observer failed to record outcome");
        }
    }
}

impl<O: PurchaseObserver> Drop for AttemptGuard<'_, O> {
    fn drop(&mut self) {
        if !self.recorded {
            self.record(
                PurchaseStatus::TransactionFailed,
                &OutcomeAttributes {
                    brand: None,
                    failure_reason: Some("purchase attempt abandoned".to_string()),
                },
            );
        }
        if let Some(handle) = self.handle.take() {
            self.observer.end_attempt(handle);
        }
    }
}
