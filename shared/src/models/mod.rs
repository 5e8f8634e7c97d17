//! Canonical data models
//!
//! Every source adapter produces these types; the store, the change detector
//! and the HTTP API only ever see the canonical shape.

pub mod change;
pub mod order;
pub mod status;

pub use change::{ChangeSet, FieldChange};
pub use order::{
    Customer, Financial, Fulfillment, FulfillmentType, LineItem, Modifier, Order, SourceSystem,
    SourceType,
};
pub use status::OrderStatus;
