use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, ItemId};

/// One catalog entry and its live inventory count.
///
/// `brand`, `model` and `price` are fixed once seeded; `stock` is the only
/// field that changes over the lifetime of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub brand: String,
    pub model: String,
    /// Informational only, in whole currency units.
    pub price: i64,
    pub stock: i64,
}

impl Item {
    pub fn new(
        id: ItemId,
        brand: impl Into<String>,
        model: impl Into<String>,
        price: i64,
        stock: i64,
    ) -> DomainResult<Self> {
        let brand = brand.into();
        let model = model.into();

        if brand.trim().is_empty() {
            return Err(DomainError::validation("brand cannot be empty"));
        }
        if model.trim().is_empty() {
            return Err(DomainError::validation("model cannot be empty"));
        }
        if price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if stock < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }

        Ok(Self {
            id,
            brand,
            model,
            price,
            stock,
        })
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Take one unit if at least `expected_minimum` units are on hand.
    ///
    /// The effective minimum is never below 1, so `stock` cannot go negative
    /// whatever the caller passes.
    pub fn take_one(&mut self, expected_minimum: i64) -> DomainResult<()> {
        if self.stock < expected_minimum.max(1) {
            return Err(DomainError::OutOfStock);
        }
        self.stock -= 1;
        Ok(())
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item_with_stock(stock: i64) -> Item {
        Item::new(ItemId::new(1).unwrap(), "Google", "Pixel 8 Pro", 999, stock).unwrap()
    }

    #[test]
    fn new_rejects_invalid_fields() {
        let id = ItemId::new(1).unwrap();
        assert!(matches!(
            Item::new(id, " ", "Pixel", 1, 1),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Item::new(id, "Google", "", 1, 1),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Item::new(id, "Google", "Pixel", -1, 1),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Item::new(id, "Google", "Pixel", 1, -1),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn take_one_decrements_until_empty() {
        let mut item = item_with_stock(2);
        item.take_one(1).unwrap();
        assert_eq!(item.stock, 1);
        item.take_one(1).unwrap();
        assert_eq!(item.stock, 0);
        assert_eq!(item.take_one(1), Err(DomainError::OutOfStock));
        assert_eq!(item.stock, 0);
    }

    #[test]
    fn take_one_honors_a_higher_minimum() {
        let mut item = item_with_stock(2);
        assert_eq!(item.take_one(3), Err(DomainError::OutOfStock));
        assert_eq!(item.stock, 2);
    }

    #[test]
    fn take_one_never_goes_below_zero_with_a_lax_minimum() {
        let mut item = item_with_stock(0);
        assert_eq!(item.take_one(0), Err(DomainError::OutOfStock));
        assert_eq!(item.take_one(-5), Err(DomainError::OutOfStock));
        assert_eq!(item.stock, 0);
    }

    #[test]
    fn serializes_with_flat_wire_shape() {
        let item = item_with_stock(5);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "brand": "Google",
                "model": "Pixel 8 Pro",
                "price": 999,
                "stock": 5,
            })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: taking from an item any number of times succeeds exactly
        /// `min(attempts, stock)` times and leaves `stock - successes` behind.
        #[test]
        fn successful_takes_never_exceed_initial_stock(
            stock in 0i64..50,
            attempts in 0usize..80,
            minimum in -2i64..3,
        ) {
            let mut item = item_with_stock(stock);
            let mut successes = 0i64;
            for _ in 0..attempts {
                if item.take_one(minimum).is_ok() {
                    successes += 1;
                }
                prop_assert!(item.stock >= 0);
            }

            prop_assert!(successes <= stock);
            prop_assert_eq!(item.stock, stock - successes);
        }
    }
}
