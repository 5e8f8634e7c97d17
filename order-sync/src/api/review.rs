//! Operator review of changed orders

use axum::extract::{Path, State};
use shared::SyncedOrder;
use shared::error::{AppError, AppResult, ApiResponse, ErrorCode};

use crate::core::AppState;
use crate::sync::ReviewEntry;

fn review_not_found(id: u64) -> AppError {
    AppError::with_message(ErrorCode::ReviewNotFound, format!("Review {id} not found"))
        .with_detail("id", id)
}

/// GET /api/reviews
pub async fn list_reviews(State(state): State<AppState>) -> ApiResponse<Vec<ReviewEntry>> {
    ApiResponse::success(state.reviews.list())
}

/// GET /api/reviews/{id}
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<ReviewEntry>> {
    state
        .reviews
        .get(id)
        .map(ApiResponse::success)
        .ok_or_else(|| review_not_found(id))
}

/// POST /api/reviews/{id}/apply: write the parked order
pub async fn apply_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<SyncedOrder>> {
    match state.coordinator.apply_review(id).await? {
        Some(synced) => Ok(ApiResponse::success(synced)),
        None => Err(review_not_found(id)),
    }
}

/// POST /api/reviews/{id}/discard: drop the parked order without writing
pub async fn discard_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<ApiResponse<ReviewEntry>> {
    state
        .reviews
        .discard(id)
        .map(ApiResponse::success)
        .ok_or_else(|| review_not_found(id))
}
