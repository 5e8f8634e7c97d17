//! Order store
//!
//! The pipeline only talks to [`OrderRepository`]; the Postgres store is used
//! in deployment and the in-memory store in development and tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryOrderRepository;
pub use postgres::PgOrderRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{LineItem, Order, SourceSystem};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Order persistence keyed by `(source_system, external_order_id)`
///
/// `upsert_order` must be a single atomic insert-or-update on that key;
/// implementations never check-then-insert.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stored order header (without line items)
    async fn find_order(
        &self,
        source: SourceSystem,
        external_order_id: &str,
    ) -> RepoResult<Option<Order>>;

    /// Insert or overwrite every mapped field, returning the internal id
    async fn upsert_order(&self, order: &Order) -> RepoResult<i64>;

    /// Delete all line items of `order_id`, then insert `items` in order
    async fn replace_line_items(&self, order_id: i64, items: &[LineItem]) -> RepoResult<()>;

    async fn line_items(&self, order_id: i64) -> RepoResult<Vec<LineItem>>;

    async fn mark_synced(&self, order_id: i64, at: DateTime<Utc>) -> RepoResult<()>;

    /// Most recently synced orders first
    async fn list_orders(&self, limit: usize) -> RepoResult<Vec<Order>>;

    /// Upsert → line-item replace → sync stamp
    ///
    /// Transactional stores override this to run all three steps in one
    /// transaction.
    async fn write_order(&self, order: &Order, synced_at: DateTime<Utc>) -> RepoResult<i64> {
        let id = self.upsert_order(order).await?;
        self.replace_line_items(id, &order.line_items).await?;
        self.mark_synced(id, synced_at).await?;
        Ok(id)
    }
}
