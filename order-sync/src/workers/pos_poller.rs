//! PosPoller: periodic POS snapshot ingestion
//!
//! Every tick fetches the current business date's orders and runs them in
//! [`SyncMode::Review`]: new orders are written, changed ones are parked for
//! review, unchanged ones are skipped.

use chrono::NaiveDate;
use shared::BatchReport;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::AppState;
use crate::error::{IngestError, IngestResult};
use crate::normalize::time;
use crate::sync::SyncMode;

pub struct PosPoller {
    state: AppState,
    interval: Duration,
    shutdown: CancellationToken,
}

impl PosPoller {
    pub fn new(state: AppState, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            state,
            interval,
            shutdown,
        }
    }

    /// Run until the shutdown token is cancelled
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "PosPoller started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // skip immediate tick

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("PosPoller shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = poll_once(&self.state, None).await {
                        tracing::error!(error = %e, "POS poll failed");
                    }
                }
            }
        }
    }
}

/// Fetch one business date (default: today in the business timezone) and sync it
///
/// Per-order failures end up in the report; only a failed fetch is an error.
pub async fn poll_once(
    state: &AppState,
    business_date: Option<NaiveDate>,
) -> IngestResult<BatchReport> {
    let Some(source) = &state.pos else {
        return Err(IngestError::Config("POS API is not configured".into()));
    };

    let date = business_date
        .unwrap_or_else(|| time::current_business_date(state.config.business_timezone));
    let records = source.fetch_orders(date).await?;

    let report = state
        .runner
        .run(records, state.pos_adapter.as_ref(), SyncMode::Review)
        .await;

    tracing::info!(
        business_date = %date,
        created = report.count(shared::Disposition::Created),
        pending_review = report.count(shared::Disposition::PendingReview),
        unchanged = report.count(shared::Disposition::Unchanged),
        failed = report.failed.len(),
        "POS poll complete"
    );
    Ok(report)
}
