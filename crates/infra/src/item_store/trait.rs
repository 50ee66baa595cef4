use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_stream::Stream;

use storefront_core::ItemId;
use storefront_inventory::Item;

/// Lazy, finite sequence of items produced by [`ItemStore::scan_all`].
pub type ItemStream<'a> = Pin<Box<dyn Stream<Item = Result<Item, ItemStoreError>> + Send + 'a>>;

/// Item store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. Only
/// `Unavailable`, `Timeout` and `Corrupt` indicate the store misbehaved; the
/// other variants are expected signals the callers branch on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemStoreError {
    /// The item schema already exists (expected on every restart against a
    /// persistent store).
    #[error("item schema already exists")]
    SchemaConflict,

    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// A conditional write was rejected by the store at commit time.
    #[error("condition not met for item {id}: stock below {expected_minimum}")]
    ConditionNotMet { id: ItemId, expected_minimum: i64 },

    /// Store unreachable, still starting, or schema not provisioned yet.
    #[error("item store unavailable: {0}")]
    Unavailable(String),

    #[error("item store timed out: {0}")]
    Timeout(String),

    /// A stored record could not be decoded into a valid `Item`.
    #[error("corrupt item record: {0}")]
    Corrupt(String),
}

impl ItemStoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Whether waiting and trying again could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ItemStoreError::Unavailable(_) | ItemStoreError::Timeout(_))
    }
}

/// Contract over the external item datastore.
///
/// ## Implementation Requirements
///
/// - `create_schema` must fail with `SchemaConflict` when the schema exists,
///   never silently succeed (bootstrap relies on it to avoid re-seeding).
/// - `conditional_decrement_stock` must be a single atomic operation evaluated
///   by the store: the stock check and the decrement happen together, so
///   concurrent callers can never drive `stock` below zero.
/// - Item operations against a store without a schema fail with `Unavailable`.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Declare the item collection (key: `id`).
    async fn create_schema(&self) -> Result<(), ItemStoreError>;

    /// Unconditional upsert. Used only by seeding.
    async fn put_item(&self, item: &Item) -> Result<(), ItemStoreError>;

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, ItemStoreError>;

    /// All items in store order (unordered). Each call starts a fresh scan.
    fn scan_all(&self) -> ItemStream<'_>;

    /// Atomically take one unit of `id` if the stored stock is at least
    /// `expected_minimum` (never less than 1) at commit time.
    ///
    /// Returns the item as it stands after the decrement.
    async fn conditional_decrement_stock(
        &self,
        id: ItemId,
        expected_minimum: i64,
    ) -> Result<Item, ItemStoreError>;
}

#[async_trait]
impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    async fn create_schema(&self) -> Result<(), ItemStoreError> {
        (**self).create_schema().await
    }

    async fn put_item(&self, item: &Item) -> Result<(), ItemStoreError> {
        (**self).put_item(item).await
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, ItemStoreError> {
        (**self).get_item(id).await
    }

    fn scan_all(&self) -> ItemStream<'_> {
        (**self).scan_all()
    }

    async fn conditional_decrement_stock(
        &self,
        id: ItemId,
        expected_minimum: i64,
    ) -> Result<Item, ItemStoreError> {
        (**self).conditional_decrement_stock(id, expected_minimum).await
    }
}
