//! Batch ingestion report types
//!
//! Returned by every ingestion entry point (webhook, POS polling, manual
//! import) so callers can report `{succeeded, failed}` and re-drive failed
//! items individually.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{ChangeSet, Order};

/// What the pipeline did with one successfully processed order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// First sighting, inserted
    Created,
    /// Existing order rewritten
    Updated,
    /// Matched the stored order (re-written or skipped depending on mode)
    Unchanged,
    /// Changed order parked for operator review, nothing written yet
    PendingReview,
}

/// A successfully processed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncedOrder {
    pub order: Order,
    pub disposition: Disposition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSet>,
    /// Review queue entry id when `disposition == PendingReview`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<u64>,
}

/// Error taxonomy for per-item failures
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Payload missing identity fields or otherwise unmappable
    Adapter,
    /// Every identity resolution attempt came back empty
    ResolutionNotFound,
    /// Upsert or line-item replace failed
    Store,
    /// Source API failure (transient)
    Upstream,
}

/// Error detail for a failed batch item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedItem {
    /// Index of the item in the batch
    pub index: u32,
    /// Best-effort identity read from the raw input (uuid / guid / order number)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub kind: FailureKind,
    pub message: String,
    /// Whether re-driving the same input later may succeed
    pub retryable: bool,
    /// Raw input, kept for manual re-drive
    pub input: Value,
}

/// Full batch outcome; a batch is never aborted by one bad record
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchReport {
    pub succeeded: Vec<SyncedOrder>,
    pub failed: Vec<FailedItem>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn count(&self, disposition: Disposition) -> usize {
        self.succeeded
            .iter()
            .filter(|s| s.disposition == disposition)
            .count()
    }

    /// Merge another report's items after this one's
    pub fn extend(&mut self, other: BatchReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.total(),
            succeeded: self.succeeded.len(),
            failed: self.failed.len(),
            created: self.count(Disposition::Created),
            updated: self.count(Disposition::Updated),
            unchanged: self.count(Disposition::Unchanged),
            pending_review: self.count(Disposition::PendingReview),
            orders: self
                .succeeded
                .iter()
                .map(|s| SyncedRef {
                    external_order_id: s.order.external_order_id.clone(),
                    order_number: s.order.order_number.clone(),
                    id: s.order.id,
                    disposition: s.disposition,
                    review_id: s.review_id,
                })
                .collect(),
            failures: self.failed.clone(),
        }
    }
}

/// Compact reference to a processed order (HTTP responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncedRef {
    pub external_order_id: String,
    pub order_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub disposition: Disposition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<u64>,
}

/// Caller-facing counts plus enough detail to retry failures individually
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub pending_review: usize,
    #[serde(default)]
    pub orders: Vec<SyncedRef>,
    #[serde(default)]
    pub failures: Vec<FailedItem>,
}
