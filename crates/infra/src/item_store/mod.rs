//! Item store boundary.
//!
//! This module defines the contract the purchase path needs from the external
//! item datastore, plus the in-memory (dev/test) and Postgres adapters.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryItemStore;
pub use postgres::PostgresItemStore;
pub use r#trait::{ItemStore, ItemStoreError, ItemStream};

use std::future::Future;
use std::time::Duration;

/// Default bound on one store round-trip (`STORE_TIMEOUT_MS`).
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound a store round-trip by `timeout`.
///
/// An elapsed timeout becomes `ItemStoreError::Timeout`; the underlying
/// operation may still have been applied by the store.
pub async fn with_timeout<T, F>(
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, ItemStoreError>
where
    F: Future<Output = Result<T, ItemStoreError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ItemStoreError::Timeout(format!(
            "{operation} exceeded {}ms",
            timeout.as_millis()
        ))),
    }
}
