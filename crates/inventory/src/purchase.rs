//! Purchase attempt outcome types.

use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Terminal status of one purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Purchased,
    NotFound,
    OutOfStock,
    TransactionFailed,
}

impl PurchaseStatus {
    pub const ALL: [PurchaseStatus; 4] = [
        PurchaseStatus::Purchased,
        PurchaseStatus::NotFound,
        PurchaseStatus::OutOfStock,
        PurchaseStatus::TransactionFailed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseStatus::Purchased => "purchased",
            PurchaseStatus::NotFound => "not_found",
            PurchaseStatus::OutOfStock => "out_of_stock",
            PurchaseStatus::TransactionFailed => "transaction_failed",
        }
    }

    /// Only transient store failures are worth retrying; not-found and
    /// out-of-stock are final answers for the attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, PurchaseStatus::TransactionFailed)
    }
}

impl core::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one purchase attempt. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// One unit was committed; `stock` is the post-decrement value.
    Purchased(Item),
    NotFound,
    OutOfStock,
    /// The store could not be reached or did not answer in time.
    TransactionFailed { reason: String },
}

impl PurchaseOutcome {
    pub fn transaction_failed(reason: impl Into<String>) -> Self {
        Self::TransactionFailed {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> PurchaseStatus {
        match self {
            PurchaseOutcome::Purchased(_) => PurchaseStatus::Purchased,
            PurchaseOutcome::NotFound => PurchaseStatus::NotFound,
            PurchaseOutcome::OutOfStock => PurchaseStatus::OutOfStock,
            PurchaseOutcome::TransactionFailed { .. } => PurchaseStatus::TransactionFailed,
        }
    }

    pub fn item(&self) -> Option<&Item> {
        match self {
            PurchaseOutcome::Purchased(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_purchased(&self) -> bool {
        matches!(self, PurchaseOutcome::Purchased(_))
    }
}

/// Non-terminal stages a purchase attempt moves through.
///
/// ```text
/// Fetching -> Deciding -> CommittingDecrement
/// ```
///
/// `Fetching` may end the attempt early (not found, or out of stock on the
/// fast path); `CommittingDecrement` always ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStage {
    Fetching,
    Deciding,
    CommittingDecrement,
}

impl PurchaseStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseStage::Fetching => "fetching",
            PurchaseStage::Deciding => "deciding",
            PurchaseStage::CommittingDecrement => "committing_decrement",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::ItemId;

    #[test]
    fn only_transaction_failed_is_retryable() {
        for status in PurchaseStatus::ALL {
            assert_eq!(
                status.is_retryable(),
                status == PurchaseStatus::TransactionFailed,
                "{status}"
            );
        }
    }

    #[test]
    fn outcome_exposes_item_only_when_purchased() {
        let item = Item::new(ItemId::new(2).unwrap(), "Apple", "iPhone 15 Pro", 1099, 2).unwrap();
        let purchased = PurchaseOutcome::Purchased(item.clone());
        assert_eq!(purchased.status(), PurchaseStatus::Purchased);
        assert_eq!(purchased.item(), Some(&item));

        let failed = PurchaseOutcome::transaction_failed("timeout");
        assert_eq!(failed.status(), PurchaseStatus::TransactionFailed);
        assert!(failed.item().is_none());
        assert!(PurchaseOutcome::OutOfStock.item().is_none());
    }

    #[test]
    fn status_serializes_as_stable_category() {
        assert_eq!(
            serde_json::to_string(&PurchaseStatus::OutOfStock).unwrap(),
            "\"out_of_stock\""
        );
        assert_eq!(PurchaseStatus::NotFound.to_string(), "not_found");
    }
}
