//! POST /api/sync/pos: on-demand POS poll
//!
//! Optional body `{"businessDate": "20240315"}`; defaults to today in the
//! business timezone.

use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use shared::BatchSummary;
use shared::error::{AppError, AppResult, ApiResponse, ErrorCode};

use super::webhook::parse_json;
use crate::core::AppState;
use crate::normalize::time;
use crate::workers::pos_poller::poll_once;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncPosRequest {
    business_date: Option<String>,
}

pub async fn sync_pos(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<ApiResponse<BatchSummary>> {
    let req: SyncPosRequest = if body.is_empty() {
        SyncPosRequest::default()
    } else {
        serde_json::from_value(parse_json(&body)?)
            .map_err(|e| AppError::invalid_request(format!("Invalid sync request: {e}")))?
    };

    let business_date = match req.business_date.as_deref() {
        Some(raw) => Some(time::parse_business_date(raw).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("businessDate must be YYYYMMDD or YYYY-MM-DD, got {raw}"),
            )
        })?),
        None => None,
    };

    let report = poll_once(&state, business_date).await?;
    Ok(ApiResponse::success(report.summary()))
}
