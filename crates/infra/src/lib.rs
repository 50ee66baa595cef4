//! Infrastructure layer: item store adapters, bootstrap, purchase and query
//! services, configuration.

/// Item store contract and adapters (in-memory, Postgres).
pub mod item_store;

/// Schema creation and catalog seeding with retry.
pub mod bootstrap;

/// Catalog listing.
pub mod query;

/// Purchase transaction engine.
pub mod purchase_engine;

/// Retry schedules.
pub mod retry;

/// Environment configuration.
pub mod config;


pub use bootstrap::{BootstrapReport, Bootstrapper};
pub use config::{AppConfig, ConfigError, StoreBackend, StoreConfig};
pub use item_store::{InMemoryItemStore, ItemStore, ItemStoreError, PostgresItemStore};
pub use purchase_engine::PurchaseEngine;
pub use query::InventoryQuery;
pub use retry::{BackoffStrategy, RetryPolicy};
