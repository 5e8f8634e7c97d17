//! HTTP routes for order-sync

pub mod freshness;
pub mod health;
pub mod import;
pub mod orders;
pub mod review;
pub mod sync;
pub mod webhook;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::core::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Inbound order traffic
    let ingest = Router::new()
        .route("/webhooks/marketplace", post(webhook::handle_webhook))
        .route("/api/import/marketplace", post(import::import_marketplace))
        .route("/api/import/marketplace/lookup", post(import::import_by_reference))
        .route("/api/sync/pos", post(sync::sync_pos));

    // Operator views
    let operator = Router::new()
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/{source}/{external_id}", get(orders::get_order))
        .route("/api/reviews", get(review::list_reviews))
        .route("/api/reviews/{id}", get(review::get_review))
        .route("/api/reviews/{id}/apply", post(review::apply_review))
        .route("/api/reviews/{id}/discard", post(review::discard_review))
        .route("/api/freshness", get(freshness::freshness));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(ingest)
        .merge(operator)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
