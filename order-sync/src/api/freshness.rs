//! GET /api/freshness: ingestion latency per channel

use axum::extract::State;
use serde::Serialize;
use shared::error::ApiResponse;

use crate::core::AppState;
use crate::sync::{ChannelStats, FreshnessSample};

/// Recent samples returned alongside the aggregates
const RECENT_SAMPLES: usize = 20;

#[derive(Debug, Serialize)]
pub struct FreshnessReport {
    pub channels: Vec<ChannelStats>,
    pub recent: Vec<FreshnessSample>,
}

pub async fn freshness(State(state): State<AppState>) -> ApiResponse<FreshnessReport> {
    ApiResponse::success(FreshnessReport {
        channels: state.freshness.snapshot(),
        recent: state.freshness.recent(RECENT_SAMPLES),
    })
}
