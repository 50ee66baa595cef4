//! The fixed catalog a fresh store is seeded with.

use storefront_core::{DomainResult, ItemId};

use crate::item::Item;

const SEED: [(i64, &str, &str, i64, i64); 3] = [
    (1, "Google", "Pixel 8 Pro", 999, 5),
    (2, "Apple", "iPhone 15 Pro", 1099, 3),
    (3, "Samsung", "Galaxy S24 Ultra", 1299, 10),
];

/// Build the seed catalog in ascending id order.
pub fn seed_catalog() -> DomainResult<Vec<Item>> {
    SEED.iter()
        .map(|&(id, brand, model, price, stock)| {
            Item::new(ItemId::new(id)?, brand, model, price, stock)
        })
        .collect()
}
