use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use storefront_core::{DomainError, ItemId};
use storefront_inventory::Item;

use super::r#trait::{ItemStore, ItemStoreError, ItemStream};

/// In-memory item store.
///
/// Intended for tests/dev. The schema is modelled as the presence of the
/// table map: until `create_schema` runs, every item operation fails with
/// `Unavailable`, like a datastore whose table does not exist yet.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    table: RwLock<Option<HashMap<ItemId, Item>>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn missing_table() -> ItemStoreError {
        ItemStoreError::unavailable("items table does not exist")
    }

    fn poisoned() -> ItemStoreError {
        ItemStoreError::unavailable("lock poisoned")
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn create_schema(&self) -> Result<(), ItemStoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        if table.is_some() {
            return Err(ItemStoreError::SchemaConflict);
        }
        *table = Some(HashMap::new());
        Ok(())
    }

    async fn put_item(&self, item: &Item) -> Result<(), ItemStoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        let items = table.as_mut().ok_or_else(Self::missing_table)?;
        items.insert(item.id, item.clone());
        Ok(())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, ItemStoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        let items = table.as_ref().ok_or_else(Self::missing_table)?;
        Ok(items.get(&id).cloned())
    }

    fn scan_all(&self) -> ItemStream<'_> {
        let snapshot: Result<Vec<Item>, ItemStoreError> = self
            .table
            .read()
            .map_err(|_| Self::poisoned())
            .and_then(|table| {
                table
                    .as_ref()
                    .map(|items| items.values().cloned().collect())
                    .ok_or_else(Self::missing_table)
            });

        match snapshot {
            Ok(items) => Box::pin(tokio_stream::iter(items.into_iter().map(Ok))),
            Err(e) => Box::pin(tokio_stream::once(Err(e))),
        }
    }

    async fn conditional_decrement_stock(
        &self,
        id: ItemId,
        expected_minimum: i64,
    ) -> Result<Item, ItemStoreError> {
        // Check and decrement under one write lock: this is the store-side
        // evaluation of the condition.
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        let items = table.as_mut().ok_or_else(Self::missing_table)?;
        let item = items.get_mut(&id).ok_or(ItemStoreError::NotFound(id))?;

        match item.take_one(expected_minimum) {
            Ok(()) => Ok(item.clone()),
            Err(DomainError::OutOfStock) => Err(ItemStoreError::ConditionNotMet {
                id,
                expected_minimum,
            }),
            Err(other) => Err(ItemStoreError::Corrupt(other.to_string())),
        }
    }
}
