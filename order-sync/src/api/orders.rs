//! Stored order views

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::error::{AppError, AppResult, ApiResponse, ErrorCode};
use shared::{Order, SourceSystem};

use crate::core::AppState;
use crate::error::IngestError;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// GET /api/orders: most recently synced first (headers only)
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let orders = state
        .repo
        .list_orders(limit)
        .await
        .map_err(IngestError::from)?;
    Ok(ApiResponse::success(orders))
}

/// GET /api/orders/{source}/{external_id}: one order with its line items
pub async fn get_order(
    State(state): State<AppState>,
    Path((source, external_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<Order>> {
    let source: SourceSystem = source
        .to_uppercase()
        .parse()
        .map_err(AppError::invalid_request)?;

    let Some(mut order) = state
        .repo
        .find_order(source, &external_id)
        .await
        .map_err(IngestError::from)?
    else {
        return Err(AppError::with_message(
            ErrorCode::OrderNotFound,
            format!("Order {source}/{external_id} not found"),
        ));
    };

    if let Some(id) = order.id {
        order.line_items = state.repo.line_items(id).await.map_err(IngestError::from)?;
    }
    Ok(ApiResponse::success(order))
}
