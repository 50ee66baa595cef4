//! Inventory domain module.
//!
//! This crate contains the catalog item model and purchase outcome types,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod catalog;
pub mod item;
pub mod purchase;

pub use catalog::seed_catalog;
pub use item::Item;
pub use purchase::{PurchaseOutcome, PurchaseStage, PurchaseStatus};
