use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};

use storefront_inventory::PurchaseOutcome;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn list_phones(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.query().list_all().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn buy_phone(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_item_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let outcome = services.engine().purchase(id).await;
    let retryable = outcome.status().is_retryable();

    let mut resp = match outcome {
        PurchaseOutcome::Purchased(phone) => {
            (StatusCode::OK, Json(dto::PurchaseResponse::new(phone))).into_response()
        }
        PurchaseOutcome::NotFound => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("phone {id} not found"))
        }
        PurchaseOutcome::OutOfStock => errors::json_error(
            StatusCode::CONFLICT,
            "out_of_stock",
            format!("phone {id} is out of stock"),
        ),
        PurchaseOutcome::TransactionFailed { .. } => errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "transaction_failed",
            "purchase could not be completed, try again later",
        ),
    };

    if retryable {
        resp.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    }
    resp
}
