//! Operator review queue for changed orders
//!
//! Polling-detected changes are parked here instead of being written. One
//! pending entry per `(source_system, external_order_id)`; a newer snapshot of
//! the same order refreshes that entry in place and keeps its id, so an id
//! read by an operator stays valid across poll ticks. Applying goes through
//! [`UpsertCoordinator::apply_review`](super::UpsertCoordinator::apply_review).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use shared::{ChangeSet, Order, SourceSystem};

#[derive(Debug, Clone, Serialize)]
pub struct ReviewEntry {
    pub id: u64,
    pub order: Order,
    pub changes: ChangeSet,
    /// First time this order was parked
    pub queued_at: DateTime<Utc>,
    /// Last time the parked snapshot was refreshed
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Pending {
    next_id: u64,
    entries: BTreeMap<u64, ReviewEntry>,
    by_key: HashMap<(SourceSystem, String), u64>,
}

#[derive(Default)]
pub struct ReviewQueue {
    inner: RwLock<Pending>,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a changed order, returning its entry id
    ///
    /// An order that already has a pending entry keeps that entry's id; only
    /// the snapshot and change set are refreshed.
    pub fn park(&self, order: Order, changes: ChangeSet) -> u64 {
        let now = shared::util::now_utc();
        let mut inner = self.inner.write();
        let key = (order.source_system, order.external_order_id.clone());

        if let Some(id) = inner.by_key.get(&key).copied()
            && let Some(entry) = inner.entries.get_mut(&id)
        {
            entry.order = order;
            entry.changes = changes;
            entry.updated_at = now;
            tracing::debug!(
                external_order_id = %entry.order.external_order_id,
                id,
                "Review entry refreshed"
            );
            return id;
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.by_key.insert(key, id);
        inner.entries.insert(
            id,
            ReviewEntry {
                id,
                order,
                changes,
                queued_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Pending entries, oldest first
    pub fn list(&self) -> Vec<ReviewEntry> {
        self.inner.read().entries.values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Option<ReviewEntry> {
        self.inner.read().entries.get(&id).cloned()
    }

    /// Remove an entry without writing it
    pub fn discard(&self, id: u64) -> Option<ReviewEntry> {
        let removed = self.remove(id);
        if let Some(entry) = &removed {
            tracing::info!(
                id,
                external_order_id = %entry.order.external_order_id,
                "Review entry discarded"
            );
        }
        removed
    }

    pub(crate) fn remove(&self, id: u64) -> Option<ReviewEntry> {
        let mut inner = self.inner.write();
        let entry = inner.entries.remove(&id)?;
        let key = (entry.order.source_system, entry.order.external_order_id.clone());
        if inner.by_key.get(&key) == Some(&id) {
            inner.by_key.remove(&key);
        }
        Some(entry)
    }

    /// Remove an applied entry unless it was refreshed after `seen`
    ///
    /// A refreshed entry holds a snapshot that has not been written yet and
    /// stays queued.
    pub(crate) fn settle(&self, id: u64, seen: DateTime<Utc>) -> bool {
        let current = self
            .inner
            .read()
            .entries
            .get(&id)
            .is_some_and(|e| e.updated_at == seen);
        current && self.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
