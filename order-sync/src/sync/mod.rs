//! Reconciliation pipeline
//!
//! ```text
//! adapter ─▶ diff ─▶ coordinator ─┬─▶ repository (upsert + line items + stamp)
//!                                 ├─▶ review queue (changed, Review mode)
//!                                 └─▶ freshness tracker
//! ```
//! [`BatchRunner`] drives the pipeline over a list of raw records.

pub mod batch;
pub mod coordinator;
pub mod diff;
pub mod freshness;
pub mod review;

pub use batch::BatchRunner;
pub use coordinator::UpsertCoordinator;
pub use diff::diff;
pub use freshness::{ChannelStats, FreshnessSample, FreshnessTracker};
pub use review::{ReviewEntry, ReviewQueue};

use serde::{Deserialize, Serialize};

/// How changed orders are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Write everything (webhook, manual import)
    Apply,
    /// Write new orders, park changed ones for operator review, skip unchanged (POS polling)
    Review,
}
