use axum::http::StatusCode;
use serde::Serialize;

use storefront_core::ItemId;
use storefront_inventory::Item;

use crate::app::errors;

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub message: &'static str,
    /// The item as it stands after the decrement.
    pub phone: Item,
}

impl PurchaseResponse {
    pub fn new(phone: Item) -> Self {
        Self {
            message: "Purchase successful!",
            phone,
        }
    }
}

// -------------------------
// Path parsing
// -------------------------

pub fn parse_item_id(raw: &str) -> Result<ItemId, axum::response::Response> {
    raw.parse::<ItemId>().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            "id must be a positive integer",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids_only() {
        assert_eq!(parse_item_id("42").unwrap().get(), 42);
        for bad in ["0", "-3", "abc", "", "1.5"] {
            let resp = parse_item_id(bad).unwrap_err();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "input {bad:?}");
        }
    }

    #[test]
    fn purchase_response_shape() {
        let phone = Item::new(ItemId::new(1).unwrap(), "Google", "Pixel 8 Pro", 999, 4).unwrap();
        let body = serde_json::to_value(PurchaseResponse::new(phone)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "message": "Purchase successful!",
                "phone": {
                    "id": 1,
                    "brand": "Google",
                    "model": "Pixel 8 Pro",
                    "price": 999,
                    "stock": 4
                }
            })
        );
    }
}
