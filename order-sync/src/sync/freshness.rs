//! Freshness tracking (observability only)
//!
//! Latency = local `last_synced_at` − source `placed_at`, per ingestion
//! channel. Answers "is the webhook path actually faster than polling".

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use shared::{Order, SourceSystem, SourceType};

/// Recent samples kept in memory
pub const SAMPLE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct FreshnessSample {
    pub source_system: SourceSystem,
    pub source_type: SourceType,
    pub external_order_id: String,
    pub placed_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
    pub latency_ms: i64,
}

/// Per-channel aggregate
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    pub source_system: SourceSystem,
    pub source_type: SourceType,
    pub count: u64,
    pub mean_latency_ms: i64,
    pub min_latency_ms: i64,
    pub max_latency_ms: i64,
    pub last_latency_ms: i64,
    pub last_synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Aggregate {
    count: u64,
    sum_ms: i128,
    min_ms: i64,
    max_ms: i64,
    last_ms: i64,
    last_synced_at: DateTime<Utc>,
}

pub struct FreshnessTracker {
    samples: Mutex<VecDeque<FreshnessSample>>,
    /// 渠道 → 聚合统计
    channels: DashMap<(SourceSystem, SourceType), Aggregate>,
    capacity: usize,
}

impl Default for FreshnessTracker {
    fn default() -> Self {
        Self::with_capacity(SAMPLE_CAPACITY)
    }
}

impl FreshnessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a written order; skipped when either timestamp is unknown
    pub fn record(&self, order: &Order) -> Option<FreshnessSample> {
        let placed_at = order.placed_at?;
        let synced_at = order.last_synced_at?;
        let latency_ms = (synced_at - placed_at).num_milliseconds();

        let sample = FreshnessSample {
            source_system: order.source_system,
            source_type: order.source_type,
            external_order_id: order.external_order_id.clone(),
            placed_at,
            synced_at,
            latency_ms,
        };

        {
            let mut samples = self.samples.lock();
            if samples.len() == self.capacity {
                samples.pop_front();
            }
            samples.push_back(sample.clone());
        }

        self.channels
            .entry((order.source_system, order.source_type))
            .and_modify(|agg| {
                agg.count += 1;
                agg.sum_ms += i128::from(latency_ms);
                agg.min_ms = agg.min_ms.min(latency_ms);
                agg.max_ms = agg.max_ms.max(latency_ms);
                agg.last_ms = latency_ms;
                agg.last_synced_at = synced_at;
            })
            .or_insert_with(|| Aggregate {
                count: 1,
                sum_ms: i128::from(latency_ms),
                min_ms: latency_ms,
                max_ms: latency_ms,
                last_ms: latency_ms,
                last_synced_at: synced_at,
            });

        tracing::debug!(
            source = %order.source_system,
            source_type = %order.source_type,
            external_order_id = %order.external_order_id,
            latency_ms,
            "Freshness sample recorded"
        );
        Some(sample)
    }

    /// Most recent samples, newest first
    pub fn recent(&self, limit: usize) -> Vec<FreshnessSample> {
        self.samples.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Aggregates per `(source_system, source_type)`
    pub fn snapshot(&self) -> Vec<ChannelStats> {
        let mut stats: Vec<ChannelStats> = self
            .channels
            .iter()
            .map(|entry| {
                let (source_system, source_type) = *entry.key();
                let agg = entry.value();
                let mean = agg.sum_ms / i128::from(agg.count.max(1));
                ChannelStats {
                    source_system,
                    source_type,
                    count: agg.count,
                    mean_latency_ms: i64::try_from(mean).unwrap_or(i64::MAX),
                    min_latency_ms: agg.min_ms,
                    max_latency_ms: agg.max_ms,
                    last_latency_ms: agg.last_ms,
                    last_synced_at: agg.last_synced_at,
                }
            })
            .collect();
        stats.sort_by_key(|s| (s.source_system, s.source_type));
        stats
    }
}
