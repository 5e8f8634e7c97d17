use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapters::{MarketplaceAdapter, PosAdapter};
use crate::core::Config;
use crate::db::{MemoryOrderRepository, OrderRepository, PgOrderRepository};
use crate::error::IngestError;
use crate::resolver::{OrderLookup, ResolutionPolicy};
use crate::sync::{BatchRunner, FreshnessTracker, ReviewQueue, UpsertCoordinator};
use crate::upstream::{MarketplaceClient, PosClient, PosOrderSource, StaticCredential};

/// 服务状态 - 持有所有组件的共享引用
///
/// Clone 只复制 Arc，成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | repo | 订单存储 (Postgres / 内存) |
/// | coordinator | upsert + review + freshness |
/// | runner | 批处理 |
/// | marketplace | GraphQL lookup (未配置时为 None) |
/// | pos | POS 拉取 (未配置时为 None) |
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: Arc<dyn OrderRepository>,
    pub reviews: Arc<ReviewQueue>,
    pub freshness: Arc<FreshnessTracker>,
    pub coordinator: Arc<UpsertCoordinator>,
    pub runner: Arc<BatchRunner>,
    pub resolution: Arc<ResolutionPolicy>,
    pub marketplace: Option<Arc<dyn OrderLookup>>,
    pub pos: Option<Arc<dyn PosOrderSource>>,
    pub webhook_adapter: Arc<MarketplaceAdapter>,
    pub import_adapter: Arc<MarketplaceAdapter>,
    pub pos_adapter: Arc<PosAdapter>,
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build state from configuration, connecting the store and API clients
    ///
    /// Fails before any order is processed when configuration is unusable.
    pub async fn new(config: Config) -> Result<Self, IngestError> {
        let repo: Arc<dyn OrderRepository> = match &config.database_url {
            Some(url) => {
                let pg = PgOrderRepository::connect(url, config.database_max_connections)
                    .await
                    .map_err(|e| IngestError::Config(format!("database unavailable: {e}")))?;
                tracing::info!("Postgres order store ready");
                Arc::new(pg)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory order store");
                Arc::new(MemoryOrderRepository::new())
            }
        };

        let marketplace: Option<Arc<dyn OrderLookup>> = match &config.marketplace {
            Some(mp) => {
                let client = MarketplaceClient::new(
                    mp.api_url.clone(),
                    Arc::new(StaticCredential::new(mp.api_token.clone())),
                    config.upstream_timeout_ms,
                )
                .map_err(|e| IngestError::Config(e.to_string()))?;
                Some(Arc::new(client))
            }
            None => None,
        };

        let pos: Option<Arc<dyn PosOrderSource>> = match &config.pos {
            Some(p) => {
                let client = PosClient::new(
                    p.api_url.clone(),
                    p.location_id.clone(),
                    Arc::new(StaticCredential::new(p.api_token.clone())),
                    p.page_size,
                    p.page_delay,
                    config.upstream_timeout_ms,
                )
                .map_err(|e| IngestError::Config(e.to_string()))?;
                Some(Arc::new(client))
            }
            None => None,
        };

        Ok(Self::with_parts(config, repo, marketplace, pos))
    }

    /// Assemble state from already-built collaborators
    pub fn with_parts(
        config: Config,
        repo: Arc<dyn OrderRepository>,
        marketplace: Option<Arc<dyn OrderLookup>>,
        pos: Option<Arc<dyn PosOrderSource>>,
    ) -> Self {
        let reviews = Arc::new(ReviewQueue::new());
        let freshness = Arc::new(FreshnessTracker::new());
        let coordinator = Arc::new(UpsertCoordinator::new(
            repo.clone(),
            reviews.clone(),
            freshness.clone(),
        ));
        let runner = Arc::new(BatchRunner::new(
            coordinator.clone(),
            config.batch_concurrency,
        ));
        let resolution =
            Arc::new(ResolutionPolicy::default().with_timeout(config.upstream_timeout()));
        let tz = config.business_timezone;

        Self {
            config: Arc::new(config),
            repo,
            reviews,
            freshness,
            coordinator,
            runner,
            resolution,
            marketplace,
            pos,
            webhook_adapter: Arc::new(MarketplaceAdapter::webhook(tz)),
            import_adapter: Arc::new(MarketplaceAdapter::manual_import(tz)),
            pos_adapter: Arc::new(PosAdapter::new(tz)),
            shutdown: CancellationToken::new(),
        }
    }

    /// In-memory state without upstream APIs
    pub fn in_memory(config: Config) -> Self {
        Self::with_parts(config, Arc::new(MemoryOrderRepository::new()), None, None)
    }
}
