//! Batch runner
//!
//! Runs a list of raw records through adapter → coordinator. One bad record
//! never aborts the batch: every item ends up in `succeeded` or `failed`, in
//! input order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::{Value, json};
use shared::{BatchReport, FailedItem, SyncedOrder};

use super::SyncMode;
use super::coordinator::UpsertCoordinator;
use crate::adapters::SourceAdapter;
use crate::error::{IngestError, IngestResult};
use crate::resolver::{OrderLookup, ResolutionPolicy};

pub struct BatchRunner {
    coordinator: Arc<UpsertCoordinator>,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(coordinator: Arc<UpsertCoordinator>, concurrency: usize) -> Self {
        Self {
            coordinator,
            concurrency: concurrency.max(1),
        }
    }

    pub fn coordinator(&self) -> &Arc<UpsertCoordinator> {
        &self.coordinator
    }

    /// Process every record; at most `concurrency` in flight, results in input order
    pub async fn run(
        &self,
        records: Vec<Value>,
        adapter: &dyn SourceAdapter,
        mode: SyncMode,
    ) -> BatchReport {
        let outcomes: Vec<(usize, Value, IngestResult<SyncedOrder>)> =
            stream::iter(records.into_iter().enumerate())
                .map(|(index, raw)| async move {
                    let result = self.process(&raw, adapter, mode).await;
                    (index, raw, result)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut report = BatchReport::default();
        for (index, raw, result) in outcomes {
            match result {
                Ok(synced) => report.succeeded.push(synced),
                Err(err) => {
                    let reference = adapter.reference(&raw);
                    report
                        .failed
                        .push(failed_item(index, reference, &err, raw));
                }
            }
        }

        tracing::info!(
            source = %adapter.source_system(),
            source_type = %adapter.source_type(),
            ?mode,
            total = report.total(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Batch processed"
        );
        report
    }

    /// Resolve a bare reference through `lookup`, then run the fetched record
    ///
    /// A resolution failure becomes the report's single failed item.
    pub async fn run_reference(
        &self,
        reference: &str,
        policy: &ResolutionPolicy,
        lookup: &dyn OrderLookup,
        adapter: &dyn SourceAdapter,
        mode: SyncMode,
    ) -> BatchReport {
        match policy.resolve_with(reference, lookup).await {
            Ok(resolution) => self.run(vec![resolution.record], adapter, mode).await,
            Err(err) => {
                let input = json!({ "reference": reference });
                BatchReport {
                    succeeded: Vec::new(),
                    failed: vec![failed_item(0, Some(reference.to_string()), &err, input)],
                }
            }
        }
    }

    async fn process(
        &self,
        raw: &Value,
        adapter: &dyn SourceAdapter,
        mode: SyncMode,
    ) -> IngestResult<SyncedOrder> {
        let order = adapter.normalize(raw)?;
        self.coordinator.sync(order, mode).await
    }
}

fn failed_item(
    index: usize,
    reference: Option<String>,
    err: &IngestError,
    input: Value,
) -> FailedItem {
    tracing::warn!(
        index,
        reference = reference.as_deref().unwrap_or("-"),
        kind = ?err.kind(),
        error = %err,
        "Batch item failed"
    );
    FailedItem {
        index: u32::try_from(index).unwrap_or(u32::MAX),
        reference,
        kind: err.kind(),
        message: err.to_string(),
        retryable: err.is_retryable(),
        input,
    }
}
