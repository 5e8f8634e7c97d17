//! order-sync: 多来源餐饮订单接入与对账
//!
//! Ingests catering orders from a POS platform (polling) and a marketplace
//! platform (webhook + manual import), normalizes them into the canonical
//! [`shared::Order`], detects changes against the stored copy and writes
//! them with an atomic upsert plus a full line-item replace.
//!
//! # 模块结构
//!
//! ```text
//! order-sync/src/
//! ├── normalize/     # money + time normalization
//! ├── adapters/      # raw payload → canonical order, envelope extraction
//! ├── resolver.rs    # bare reference → source lookup with fallbacks
//! ├── sync/          # diff, upsert coordinator, review queue, batch runner, freshness
//! ├── db/            # OrderRepository (Postgres / in-memory)
//! ├── upstream/      # POS + marketplace API clients
//! ├── workers/       # POS poller
//! ├── api/           # HTTP routes
//! ├── core/          # config + state
//! └── utils/         # logger
//! ```

pub mod adapters;
pub mod api;
pub mod core;
pub mod db;
pub mod error;
pub mod normalize;
pub mod resolver;
pub mod sync;
pub mod upstream;
pub mod utils;
pub mod workers;

// Re-export 公共类型
pub use core::{AppState, Config};
pub use error::{IngestError, IngestResult};
pub use sync::{BatchRunner, SyncMode, UpsertCoordinator};

// Re-export logger
pub use utils::logger::init_logger;
