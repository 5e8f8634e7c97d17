//! Manual marketplace import
//!
//! - POST /api/import/marketplace: envelope or list of order objects
//! - POST /api/import/marketplace/lookup: `{reference}` resolved, then imported

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use shared::BatchSummary;
use shared::error::{AppError, AppResult, ApiResponse};

use super::webhook::{ingest_payload, parse_json};
use crate::core::AppState;
use crate::sync::SyncMode;

pub async fn import_marketplace(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<ApiResponse<BatchSummary>> {
    let payload = parse_json(&body)?;
    let report = ingest_payload(&state, &payload, state.import_adapter.as_ref()).await?;
    Ok(ApiResponse::success(report.summary()))
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub reference: String,
}

/// Resolve an operator-typed reference and import the order
///
/// Resolution failures surface as errors (404 / 502 / 504); nothing is
/// written for an unresolved reference.
pub async fn import_by_reference(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> AppResult<ApiResponse<BatchSummary>> {
    let Some(lookup) = &state.marketplace else {
        return Err(AppError::config("Marketplace API is not configured"));
    };

    let resolution = state
        .resolution
        .resolve_with(&req.reference, lookup.as_ref())
        .await?;

    tracing::info!(
        reference = %req.reference,
        matched = %resolution.matched,
        attempts = resolution.attempts,
        "Manual import reference resolved"
    );

    let report = state
        .runner
        .run(
            vec![resolution.record],
            state.import_adapter.as_ref(),
            SyncMode::Apply,
        )
        .await;
    Ok(ApiResponse::success(report.summary()))
}
