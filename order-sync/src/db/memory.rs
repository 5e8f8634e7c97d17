//! In-memory order store
//!
//! Same protocol as the Postgres store. `write_order` runs all three steps
//! under one lock, the way the Postgres store runs them in one transaction.
//! Used when no `DATABASE_URL` is configured in development, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared::{LineItem, Order, SourceSystem};

use super::{OrderRepository, RepoError, RepoResult};

#[derive(Default)]
struct Tables {
    next_id: i64,
    orders: HashMap<i64, Order>,
    /// 唯一键索引 (source_system, external_order_id) → id
    keys: HashMap<(SourceSystem, String), i64>,
    items: HashMap<i64, Vec<LineItem>>,
}

impl Tables {
    fn upsert(&mut self, order: &Order) -> RepoResult<i64> {
        if order.external_order_id.is_empty() {
            return Err(RepoError::Validation("external_order_id is empty".into()));
        }

        let key = (order.source_system, order.external_order_id.clone());
        let id = match self.keys.get(&key) {
            Some(id) => *id,
            None => {
                self.next_id += 1;
                let id = self.next_id;
                self.keys.insert(key, id);
                id
            }
        };

        // last_synced_at is owned by mark_synced
        let last_synced_at = self.orders.get(&id).and_then(|o| o.last_synced_at);
        let stored = Order {
            id: Some(id),
            last_synced_at,
            line_items: Vec::new(),
            ..order.clone()
        };
        self.orders.insert(id, stored);
        Ok(id)
    }

    fn replace_items(&mut self, order_id: i64, items: &[LineItem]) -> RepoResult<()> {
        if !self.orders.contains_key(&order_id) {
            return Err(RepoError::NotFound(format!("order {order_id}")));
        }
        self.items.insert(order_id, items.to_vec());
        Ok(())
    }

    fn mark_synced(&mut self, order_id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| RepoError::NotFound(format!("order {order_id}")))?;
        order.last_synced_at = Some(at);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOrderRepository {
    tables: Mutex<Tables>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders
    pub fn order_count(&self) -> usize {
        self.tables.lock().orders.len()
    }

    /// Number of stored line items across all orders
    pub fn line_item_count(&self) -> usize {
        self.tables.lock().items.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn find_order(
        &self,
        source: SourceSystem,
        external_order_id: &str,
    ) -> RepoResult<Option<Order>> {
        let tables = self.tables.lock();
        let found = tables
            .keys
            .get(&(source, external_order_id.to_string()))
            .and_then(|id| tables.orders.get(id))
            .map(|order| Order {
                line_items: Vec::new(),
                ..order.clone()
            });
        Ok(found)
    }

    async fn upsert_order(&self, order: &Order) -> RepoResult<i64> {
        self.tables.lock().upsert(order)
    }

    async fn replace_line_items(&self, order_id: i64, items: &[LineItem]) -> RepoResult<()> {
        self.tables.lock().replace_items(order_id, items)
    }

    async fn line_items(&self, order_id: i64) -> RepoResult<Vec<LineItem>> {
        Ok(self
            .tables
            .lock()
            .items
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_synced(&self, order_id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        self.tables.lock().mark_synced(order_id, at)
    }

    async fn list_orders(&self, limit: usize) -> RepoResult<Vec<Order>> {
        let tables = self.tables.lock();
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.last_synced_at
                .cmp(&a.last_synced_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        orders.truncate(limit);
        Ok(orders)
    }

    async fn write_order(&self, order: &Order, synced_at: DateTime<Utc>) -> RepoResult<i64> {
        let mut tables = self.tables.lock();
        let id = tables.upsert(order)?;
        tables.replace_items(id, &order.line_items)?;
        tables.mark_synced(id, synced_at)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::SourceType;

    fn order(ext: &str, name: &str) -> Order {
        Order {
            id: None,
            source_system: SourceSystem::Marketplace,
            source_type: SourceType::Webhook,
            external_order_id: ext.to_string(),
            order_number: "A-1".to_string(),
            customer: shared::Customer {
                name: Some(name.to_string()),
                ..Default::default()
            },
            fulfillment: Default::default(),
            headcount: None,
            financial: Default::default(),
            status: Default::default(),
            raw_payload: serde_json::Value::Null,
            placed_at: None,
            last_synced_at: None,
            line_items: Vec::new(),
        }
    }

    fn item(name: &str) -> LineItem {
        LineItem {
            item_ref: None,
            name: name.to_string(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ONE,
            total_price: Decimal::ONE,
            modifiers: Vec::new(),
            special_request: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_same_key_keeps_one_row() {
        let repo = MemoryOrderRepository::new();
        let a = repo.upsert_order(&order("u-1", "Ann")).await.unwrap();
        let b = repo.upsert_order(&order("u-1", "Bob")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(repo.order_count(), 1);

        let stored = repo
            .find_order(SourceSystem::Marketplace, "u-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.customer.name.as_deref(), Some("Bob"));
        assert_eq!(stored.id, Some(a));
    }

    #[tokio::test]
    async fn test_same_external_id_different_source_is_distinct() {
        let repo = MemoryOrderRepository::new();
        let mut pos = order("same", "Ann");
        pos.source_system = SourceSystem::Pos;
        let a = repo.upsert_order(&pos).await.unwrap();
        let b = repo.upsert_order(&order("same", "Ann")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(repo.order_count(), 2);
    }

    #[tokio::test]
    async fn test_replace_line_items_is_full_set() {
        let repo = MemoryOrderRepository::new();
        let id = repo.upsert_order(&order("u-1", "Ann")).await.unwrap();
        repo.replace_line_items(id, &[item("a"), item("b"), item("c")])
            .await
            .unwrap();
        repo.replace_line_items(id, &[item("d")]).await.unwrap();

        let items = repo.line_items(id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "d");
    }

    #[tokio::test]
    async fn test_replace_line_items_unknown_order() {
        let repo = MemoryOrderRepository::new();
        let err = repo.replace_line_items(99, &[item("a")]).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_preserves_sync_stamp() {
        let repo = MemoryOrderRepository::new();
        let id = repo.upsert_order(&order("u-1", "Ann")).await.unwrap();
        let at = Utc::now();
        repo.mark_synced(id, at).await.unwrap();
        repo.upsert_order(&order("u-1", "Ann")).await.unwrap();

        let stored = repo
            .find_order(SourceSystem::Marketplace, "u-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_synced_at, Some(at));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_keep_header_and_items_together() {
        let repo = std::sync::Arc::new(MemoryOrderRepository::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("writer-{i}");
                let mut o = order("u-1", &name);
                o.line_items = (0..(i % 3 + 1)).map(|_| item(&name)).collect();
                repo.write_order(&o, Utc::now()).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo
            .find_order(SourceSystem::Marketplace, "u-1")
            .await
            .unwrap()
            .unwrap();
        let writer = stored.customer.name.unwrap();
        let items = repo.line_items(stored.id.unwrap()).await.unwrap();
        assert!(!items.is_empty());
        assert!(items.iter().all(|i| i.name == writer));
        assert!(stored.last_synced_at.is_some());
        assert_eq!(repo.order_count(), 1);
    }
}
