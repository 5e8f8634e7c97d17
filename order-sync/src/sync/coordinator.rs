//! Upsert coordinator
//!
//! Per order: diff against the stored row, then either write
//! (upsert → line-item replace → sync stamp) or park for review.
//! Writes never check-then-insert; uniqueness of
//! `(source_system, external_order_id)` is the store's upsert conflict key.

use std::sync::Arc;

use shared::{ChangeSet, Disposition, Order, SyncedOrder};

use super::diff::diff;
use super::freshness::FreshnessTracker;
use super::review::ReviewQueue;
use super::SyncMode;
use crate::db::OrderRepository;
use crate::error::IngestResult;

pub struct UpsertCoordinator {
    repo: Arc<dyn OrderRepository>,
    reviews: Arc<ReviewQueue>,
    freshness: Arc<FreshnessTracker>,
}

impl UpsertCoordinator {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        reviews: Arc<ReviewQueue>,
        freshness: Arc<FreshnessTracker>,
    ) -> Self {
        Self {
            repo,
            reviews,
            freshness,
        }
    }

    pub fn repository(&self) -> &Arc<dyn OrderRepository> {
        &self.repo
    }

    pub fn reviews(&self) -> &Arc<ReviewQueue> {
        &self.reviews
    }

    /// Reconcile one canonical order with the store
    pub async fn sync(&self, incoming: Order, mode: SyncMode) -> IngestResult<SyncedOrder> {
        let stored = self
            .repo
            .find_order(incoming.source_system, &incoming.external_order_id)
            .await?;
        let changes = diff(&incoming, stored.as_ref());

        if let Some(prev) = &stored
            && prev.status.is_regression(incoming.status)
        {
            // 状态回退照常写入 (来源可能重新打开订单)
            tracing::warn!(
                source = %incoming.source_system,
                external_order_id = %incoming.external_order_id,
                from = %prev.status,
                to = %incoming.status,
                "Order status moved backwards"
            );
        }

        if changes.is_new {
            let order = self.write(incoming).await?;
            log_outcome(&order, Disposition::Created, &changes);
            return Ok(SyncedOrder {
                order,
                disposition: Disposition::Created,
                changes: Some(changes),
                review_id: None,
            });
        }

        match (mode, changes.is_changed) {
            (SyncMode::Review, true) => {
                let order = Order {
                    id: stored.as_ref().and_then(|s| s.id),
                    last_synced_at: stored.as_ref().and_then(|s| s.last_synced_at),
                    ..incoming
                };
                let review_id = self.reviews.park(order.clone(), changes.clone());
                log_outcome(&order, Disposition::PendingReview, &changes);
                Ok(SyncedOrder {
                    order,
                    disposition: Disposition::PendingReview,
                    changes: Some(changes),
                    review_id: Some(review_id),
                })
            }
            (SyncMode::Review, false) => {
                let order = Order {
                    id: stored.as_ref().and_then(|s| s.id),
                    last_synced_at: stored.as_ref().and_then(|s| s.last_synced_at),
                    ..incoming
                };
                log_outcome(&order, Disposition::Unchanged, &changes);
                Ok(SyncedOrder {
                    order,
                    disposition: Disposition::Unchanged,
                    changes: Some(changes),
                    review_id: None,
                })
            }
            (SyncMode::Apply, changed) => {
                let disposition = if changed {
                    Disposition::Updated
                } else {
                    Disposition::Unchanged
                };
                let order = self.write(incoming).await?;
                log_outcome(&order, disposition, &changes);
                Ok(SyncedOrder {
                    order,
                    disposition,
                    changes: Some(changes),
                    review_id: None,
                })
            }
        }
    }

    /// Write protocol: upsert → replace line items → stamp `last_synced_at`
    pub async fn write(&self, order: Order) -> IngestResult<Order> {
        let synced_at = shared::util::now_utc();
        let id = self.repo.write_order(&order, synced_at).await?;
        let order = Order {
            id: Some(id),
            last_synced_at: Some(synced_at),
            ..order
        };
        self.freshness.record(&order);
        Ok(order)
    }

    /// Write a parked review entry; `None` when the id is unknown
    ///
    /// The entry stays queued if the write fails, or if a newer snapshot was
    /// parked while the write was in flight.
    pub async fn apply_review(&self, review_id: u64) -> IngestResult<Option<SyncedOrder>> {
        let Some(entry) = self.reviews.get(review_id) else {
            return Ok(None);
        };

        let order = self.write(entry.order).await?;
        if !self.reviews.settle(review_id, entry.updated_at) {
            tracing::info!(review_id, "Review entry refreshed during apply, kept queued");
        }
        tracing::info!(
            review_id,
            external_order_id = %order.external_order_id,
            order_id = ?order.id,
            "Review entry applied"
        );

        Ok(Some(SyncedOrder {
            order,
            disposition: Disposition::Updated,
            changes: Some(entry.changes),
            review_id: Some(review_id),
        }))
    }
}

fn log_outcome(order: &Order, disposition: Disposition, changes: &ChangeSet) {
    let outcome = match disposition {
        Disposition::Created => "created",
        Disposition::Updated => "updated",
        Disposition::Unchanged => "unchanged",
        Disposition::PendingReview => "pending_review",
    };
    tracing::info!(
        source = %order.source_system,
        source_type = %order.source_type,
        external_order_id = %order.external_order_id,
        order_id = ?order.id,
        outcome,
        changed_fields = ?changes.field_names(),
        "Order synced"
    );
}
