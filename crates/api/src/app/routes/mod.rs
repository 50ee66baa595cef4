use axum::{
    routing::{get, post},
    Router,
};

pub mod phones;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .route("/api/phones", get(phones::list_phones))
        .route("/api/buy/:id", post(phones::buy_phone))
}
