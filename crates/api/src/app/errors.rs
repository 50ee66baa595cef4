use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_infra::ItemStoreError;

pub fn store_error_to_response(err: ItemStoreError) -> axum::response::Response {
    match err {
        ItemStoreError::Corrupt(msg) => {
            tracing::error!(error = %msg, "corrupt item record");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "corrupt item record")
        }
        other => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "store_unavailable",
            other.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
