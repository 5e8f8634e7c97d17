//! Shared types for the catering order sync platform
//!
//! Canonical order model, batch report DTOs and the unified error system used
//! by `order-sync` and anything that consumes its HTTP API.

pub mod error;
pub mod ingest;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use ingest::{
    BatchReport, BatchSummary, Disposition, FailedItem, FailureKind, SyncedOrder, SyncedRef,
};
pub use models::{
    ChangeSet, Customer, FieldChange, Financial, Fulfillment, FulfillmentType, LineItem, Modifier,
    Order, OrderStatus, SourceSystem, SourceType,
};
