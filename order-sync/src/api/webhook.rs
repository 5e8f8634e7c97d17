//! Marketplace webhook handler
//!
//! POST /webhooks/marketplace: any known envelope, or an event notification
//! carrying only an entity id (the order is then fetched through the
//! identity resolver). Per-item failures are reported in the body with
//! HTTP 200; only an unparseable body is rejected.

use axum::body::Bytes;
use axum::extract::State;
use serde_json::Value;
use shared::error::{AppError, AppResult, ApiResponse, ErrorCode};
use shared::{BatchReport, BatchSummary};

use crate::adapters::{SourceAdapter, extract_records, notification_entity_id};
use crate::core::AppState;
use crate::sync::SyncMode;

pub async fn handle_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<ApiResponse<BatchSummary>> {
    let payload = parse_json(&body)?;
    let report = ingest_payload(&state, &payload, state.webhook_adapter.as_ref()).await?;
    Ok(ApiResponse::success(report.summary()))
}

/// Raw body → JSON, rejecting anything that is not JSON
pub(crate) fn parse_json(body: &Bytes) -> AppResult<Value> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(%e, "Failed to parse request JSON");
        AppError::with_message(ErrorCode::InvalidFormat, format!("Body is not valid JSON: {e}"))
    })
}

/// Envelope or notification → batch report (Apply mode)
pub(crate) async fn ingest_payload(
    state: &AppState,
    payload: &Value,
    adapter: &dyn SourceAdapter,
) -> AppResult<BatchReport> {
    if let Some((envelope, records)) = extract_records(payload) {
        tracing::info!(
            envelope = envelope.name(),
            count = records.len(),
            source_type = %adapter.source_type(),
            "Marketplace payload received"
        );
        return Ok(state.runner.run(records, adapter, SyncMode::Apply).await);
    }

    if let Some(entity_id) = notification_entity_id(payload) {
        let Some(lookup) = &state.marketplace else {
            return Err(AppError::config(
                "Marketplace API is not configured; cannot fetch notified order",
            ));
        };
        tracing::info!(entity_id = %entity_id, "Marketplace notification received");
        return Ok(state
            .runner
            .run_reference(
                &entity_id,
                &state.resolution,
                lookup.as_ref(),
                adapter,
                SyncMode::Apply,
            )
            .await);
    }

    tracing::warn!("Unrecognized marketplace payload shape");
    Err(AppError::new(ErrorCode::UnrecognizedEnvelope))
}
