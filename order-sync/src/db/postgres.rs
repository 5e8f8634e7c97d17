//! PostgreSQL order store
//!
//! `write_order` runs upsert → line-item replace → sync stamp in one
//! transaction, so a failed write never leaves a half-replaced cart.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Customer, Financial, Fulfillment, FulfillmentType, LineItem, Modifier, Order, OrderStatus,
    SourceSystem, SourceType,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use super::{OrderRepository, RepoError, RepoResult};

const ORDER_COLUMNS: &str = r#"
    id, source_system, source_type, external_order_id, order_number,
    customer_name, customer_email, customer_phone,
    fulfillment_type, fulfillment_date, fulfillment_time, fulfillment_address, fulfillment_notes,
    headcount, subtotal, tax, tip, delivery_fee, total, status,
    raw_payload, placed_at, last_synced_at
"#;

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run embedded migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| RepoError::Database(format!("migration failed: {e}")))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    source_system: String,
    source_type: String,
    external_order_id: String,
    order_number: String,
    customer_name: Option<String>,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    fulfillment_type: String,
    fulfillment_date: Option<NaiveDate>,
    fulfillment_time: Option<NaiveTime>,
    fulfillment_address: Option<String>,
    fulfillment_notes: Option<String>,
    headcount: Option<i32>,
    subtotal: Decimal,
    tax: Decimal,
    tip: Decimal,
    delivery_fee: Option<Decimal>,
    total: Decimal,
    status: String,
    raw_payload: serde_json::Value,
    placed_at: Option<DateTime<Utc>>,
    last_synced_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: Some(row.id),
            source_system: row
                .source_system
                .parse::<SourceSystem>()
                .map_err(RepoError::Validation)?,
            source_type: row
                .source_type
                .parse::<SourceType>()
                .map_err(RepoError::Validation)?,
            external_order_id: row.external_order_id,
            order_number: row.order_number,
            customer: Customer {
                name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
            },
            fulfillment: Fulfillment {
                kind: row
                    .fulfillment_type
                    .parse::<FulfillmentType>()
                    .map_err(RepoError::Validation)?,
                date: row.fulfillment_date,
                time: row.fulfillment_time,
                address: row.fulfillment_address,
                notes: row.fulfillment_notes,
            },
            headcount: row.headcount.and_then(|h| u32::try_from(h).ok()),
            financial: Financial {
                subtotal: row.subtotal,
                tax: row.tax,
                tip: row.tip,
                delivery_fee: row.delivery_fee,
                total: row.total,
            },
            status: row
                .status
                .parse::<OrderStatus>()
                .map_err(RepoError::Validation)?,
            raw_payload: row.raw_payload,
            placed_at: row.placed_at,
            last_synced_at: row.last_synced_at,
            line_items: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    item_ref: Option<String>,
    name: String,
    quantity: Decimal,
    unit_price: Decimal,
    total_price: Decimal,
    modifiers: Json<Vec<Modifier>>,
    special_request: Option<String>,
}

impl From<LineItemRow> for LineItem {
    fn from(row: LineItemRow) -> Self {
        LineItem {
            item_ref: row.item_ref,
            name: row.name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            modifiers: row.modifiers.0,
            special_request: row.special_request,
        }
    }
}

// ── Statements shared by the pooled and transactional paths ──

async fn upsert_order_on(conn: &mut PgConnection, order: &Order) -> RepoResult<i64> {
    let headcount = order.headcount.and_then(|h| i32::try_from(h).ok());

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO orders (
            source_system, source_type, external_order_id, order_number,
            customer_name, customer_email, customer_phone,
            fulfillment_type, fulfillment_date, fulfillment_time,
            fulfillment_address, fulfillment_notes,
            headcount, subtotal, tax, tip, delivery_fee, total, status,
            raw_payload, placed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
        ON CONFLICT (source_system, external_order_id)
        DO UPDATE SET
            source_type = EXCLUDED.source_type, order_number = EXCLUDED.order_number,
            customer_name = EXCLUDED.customer_name, customer_email = EXCLUDED.customer_email,
            customer_phone = EXCLUDED.customer_phone,
            fulfillment_type = EXCLUDED.fulfillment_type,
            fulfillment_date = EXCLUDED.fulfillment_date,
            fulfillment_time = EXCLUDED.fulfillment_time,
            fulfillment_address = EXCLUDED.fulfillment_address,
            fulfillment_notes = EXCLUDED.fulfillment_notes,
            headcount = EXCLUDED.headcount, subtotal = EXCLUDED.subtotal, tax = EXCLUDED.tax,
            tip = EXCLUDED.tip, delivery_fee = EXCLUDED.delivery_fee, total = EXCLUDED.total,
            status = EXCLUDED.status, raw_payload = EXCLUDED.raw_payload,
            placed_at = EXCLUDED.placed_at, updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(order.source_system.as_str())
    .bind(order.source_type.as_str())
    .bind(&order.external_order_id)
    .bind(&order.order_number)
    .bind(&order.customer.name)
    .bind(&order.customer.email)
    .bind(&order.customer.phone)
    .bind(order.fulfillment.kind.as_str())
    .bind(order.fulfillment.date)
    .bind(order.fulfillment.time)
    .bind(&order.fulfillment.address)
    .bind(&order.fulfillment.notes)
    .bind(headcount)
    .bind(order.financial.subtotal)
    .bind(order.financial.tax)
    .bind(order.financial.tip)
    .bind(order.financial.delivery_fee)
    .bind(order.financial.total)
    .bind(order.status.as_str())
    .bind(&order.raw_payload)
    .bind(order.placed_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.0)
}

async fn replace_line_items_on(
    conn: &mut PgConnection,
    order_id: i64,
    items: &[LineItem],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM order_line_items WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_line_items (
                order_id, position, item_ref, name, quantity,
                unit_price, total_price, modifiers, special_request
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order_id)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .bind(&item.item_ref)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .bind(Json(&item.modifiers))
        .bind(&item.special_request)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn mark_synced_on(conn: &mut PgConnection, order_id: i64, at: DateTime<Utc>) -> RepoResult<()> {
    let result = sqlx::query("UPDATE orders SET last_synced_at = $1 WHERE id = $2")
        .bind(at)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("order {order_id}")));
    }
    Ok(())
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_order(
        &self,
        source: SourceSystem,
        external_order_id: &str,
    ) -> RepoResult<Option<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE source_system = $1 AND external_order_id = $2"
        );
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(source.as_str())
            .bind(external_order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn upsert_order(&self, order: &Order) -> RepoResult<i64> {
        let mut conn = self.pool.acquire().await?;
        upsert_order_on(&mut conn, order).await
    }

    async fn replace_line_items(&self, order_id: i64, items: &[LineItem]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        replace_line_items_on(&mut tx, order_id, items).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn line_items(&self, order_id: i64) -> RepoResult<Vec<LineItem>> {
        let rows: Vec<LineItemRow> = sqlx::query_as(
            r#"
            SELECT item_ref, name, quantity, unit_price, total_price, modifiers, special_request
            FROM order_line_items WHERE order_id = $1 ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LineItem::from).collect())
    }

    async fn mark_synced(&self, order_id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        let mut conn = self.pool.acquire().await?;
        mark_synced_on(&mut conn, order_id, at).await
    }

    async fn list_orders(&self, limit: usize) -> RepoResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY last_synced_at DESC NULLS LAST, id DESC LIMIT $1"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn write_order(&self, order: &Order, synced_at: DateTime<Utc>) -> RepoResult<i64> {
        let mut tx = self.pool.begin().await?;
        let id = upsert_order_on(&mut tx, order).await?;
        replace_line_items_on(&mut tx, id, &order.line_items).await?;
        mark_synced_on(&mut tx, id, synced_at).await?;
        tx.commit().await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    const SCHEMA: &str = include_str!("../../migrations/0001_create_orders.sql");

    #[test]
    fn test_schema_keeps_source_precision() {
        // money and quantity are stored as given, no scale rounding
        assert!(!SCHEMA.contains("NUMERIC("));
        let quantity = SCHEMA
            .lines()
            .find(|l| l.trim_start().starts_with("quantity"))
            .unwrap();
        assert!(quantity.contains("NUMERIC"));
        assert!(quantity.contains("CHECK (quantity > 0)"));
    }
}
