//! Health check endpoint

use axum::Json;
use axum::extract::State;

use crate::core::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "order-sync",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "store": if state.config.database_url.is_some() { "postgres" } else { "memory" },
        "pos_polling": state.pos.is_some(),
        "marketplace_lookup": state.marketplace.is_some(),
        "pending_reviews": state.reviews.len(),
    }))
}
