//! Read side of the storefront: list the full catalog.

use std::time::Duration;

use tokio_stream::StreamExt;
use tracing::instrument;

use storefront_core::Entity;
use storefront_inventory::Item;

use crate::item_store::{with_timeout, ItemStore, ItemStoreError, DEFAULT_STORE_TIMEOUT};

/// Catalog listing over an [`ItemStore`].
#[derive(Debug, Clone)]
pub struct InventoryQuery<S> {
    store: S,
    timeout: Duration,
}

impl<S> InventoryQuery<S>
where
    S: ItemStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Every item currently in the store, ordered by id.
    ///
    /// Any stream error fails the whole listing; partial results are never
    /// returned.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Item>, ItemStoreError> {
        let mut items: Vec<Item> = with_timeout(self.timeout, "scan_all", async {
            self.store.scan_all().collect::<Result<Vec<_>, _>>().await
        })
        .await?;

        items.sort_by_key(Entity::id);
        tracing::debug!(count = items.len(), "listed catalog");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;

    use storefront_core::ItemId;
    use storefront_inventory::seed_catalog;

    use crate::item_store::{InMemoryItemStore, ItemStream};

    async fn seeded() -> Arc<InMemoryItemStore> {
        let store = Arc::new(InMemoryItemStore::new());
        store.create_schema().await.unwrap();
        for item in seed_catalog().unwrap().iter().rev() {
            store.put_item(item).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn lists_seeded_catalog_sorted_by_id() {
        let query = InventoryQuery::new(seeded().await);

        let items = query.list_all().await.unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(items[0].model, "Pixel 8 Pro");
    }

    #[tokio::test]
    async fn reflects_purchases() {
        let store = seeded().await;
        let query = InventoryQuery::new(store.clone());

        store
            .conditional_decrement_stock(ItemId::new(2).unwrap(), 1)
            .await
            .unwrap();

        let items = query.list_all().await.unwrap();
        assert_eq!(items[1].stock, 2);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = Arc::new(InMemoryItemStore::new());
        store.create_schema().await.unwrap();

        assert!(InventoryQuery::new(store).list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_schema_is_an_error() {
        let query = InventoryQuery::new(Arc::new(InMemoryItemStore::new()));
        assert!(matches!(
            query.list_all().await,
            Err(ItemStoreError::Unavailable(_))
        ));
    }

    /// Yields one good page, then fails.
    struct BrokenPagination {
        inner: InMemoryItemStore,
    }

    #[async_trait]
    impl ItemStore for BrokenPagination {
        async fn create_schema(&self) -> Result<(), ItemStoreError> {
            self.inner.create_schema().await
        }

        async fn put_item(&self, item: &Item) -> Result<(), ItemStoreError> {
            self.inner.put_item(item).await
        }

        async fn get_item(&self, id: ItemId) -> Result<Option<Item>, ItemStoreError> {
            self.inner.get_item(id).await
        }

        fn scan_all(&self) -> ItemStream<'_> {
            let failure = tokio_stream::once(Err(ItemStoreError::unavailable("page 2 lost")));
            Box::pin(self.inner.scan_all().take(1).chain(failure))
        }

        async fn conditional_decrement_stock(
            &self,
            id: ItemId,
            expected_minimum: i64,
        ) -> Result<Item, ItemStoreError> {
            self.inner.conditional_decrement_stock(id, expected_minimum).await
        }
    }

    #[tokio::test]
    async fn failing_page_fails_the_whole_listing() {
        let inner = InMemoryItemStore::new();
        inner.create_schema().await.unwrap();
        for item in seed_catalog().unwrap() {
            inner.put_item(&item).await.unwrap();
        }

        let query = InventoryQuery::new(BrokenPagination { inner });
        assert!(query.list_all().await.is_err());
    }
}
