//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use order_sync::db::MemoryOrderRepository;
use order_sync::resolver::OrderLookup;
use order_sync::upstream::{PosOrderSource, UpstreamError};
use order_sync::{AppState, Config};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Marketplace order object with `items` line items and a total in cents
pub fn marketplace_order(uuid: &str, total_cents: i64, items: &[&str]) -> Value {
    let order_items: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "uuid": format!("{uuid}-item-{i}"),
                "name": name,
                "quantity": 2,
                "unitPrice": { "subunits": 500, "currency": "USD" },
                "totalInSubunits": { "subunits": 1000, "currency": "USD" }
            })
        })
        .collect();

    json!({
        "uuid": uuid,
        "orderNumber": format!("MP-{uuid}"),
        "status": "confirmed",
        "createdAt": "2024-03-10T14:00:00Z",
        "event": {
            "timestamp": "2024-03-15T16:00:00Z",
            "orderType": "pickup",
            "headcount": 20
        },
        "orderCustomer": { "fullName": "Dana Reyes", "email": "dana@example.com" },
        "totals": {
            "subTotal": { "subunits": total_cents, "currency": "USD" },
            "customerTotalDue": { "subunits": total_cents, "currency": "USD" }
        },
        "catererCart": { "orderItems": order_items }
    })
}

/// POS export record
pub fn pos_order(guid: &str, guests: u32, total: f64) -> Value {
    json!({
        "guid": guid,
        "displayNumber": "0042",
        "openedDate": "2024-03-14T20:05:00.000+0000",
        "promisedDate": "2024-03-15T16:30:00.000+0000",
        "numberOfGuests": guests,
        "approvalStatus": "APPROVED",
        "checks": [{
            "amount": total,
            "taxAmount": 0,
            "totalAmount": total,
            "selections": [
                { "guid": format!("{guid}-s1"), "displayName": "Platter", "quantity": 1, "price": total }
            ]
        }]
    })
}

/// Lookup answering from a fixed table and recording each requested id
#[derive(Default)]
pub struct ScriptedLookup {
    answers: HashMap<String, Value>,
    failing: HashMap<String, UpstreamError>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, id: &str, order: Value) -> Self {
        self.answers.insert(id.to_string(), order);
        self
    }

    pub fn with_failure(mut self, id: &str, err: UpstreamError) -> Self {
        self.failing.insert(id.to_string(), err);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl OrderLookup for ScriptedLookup {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Value>, UpstreamError> {
        self.calls.lock().push(id.to_string());
        if let Some(err) = self.failing.get(id) {
            return Err(err.clone());
        }
        Ok(self.answers.get(id).cloned())
    }
}

/// POS source serving whatever snapshot was last set
#[derive(Default)]
pub struct FakePos {
    snapshot: Mutex<Vec<Value>>,
    pub requested: Mutex<Vec<NaiveDate>>,
}

impl FakePos {
    pub fn set(&self, records: Vec<Value>) {
        *self.snapshot.lock() = records;
    }
}

#[async_trait]
impl PosOrderSource for FakePos {
    async fn fetch_orders(&self, business_date: NaiveDate) -> Result<Vec<Value>, UpstreamError> {
        self.requested.lock().push(business_date);
        Ok(self.snapshot.lock().clone())
    }
}

pub struct Harness {
    pub state: AppState,
    pub repo: Arc<MemoryOrderRepository>,
    pub lookup: Arc<ScriptedLookup>,
    pub pos: Arc<FakePos>,
}

pub fn harness(lookup: ScriptedLookup) -> Harness {
    let repo = Arc::new(MemoryOrderRepository::new());
    let lookup = Arc::new(lookup);
    let pos = Arc::new(FakePos::default());
    let marketplace: Arc<dyn OrderLookup> = lookup.clone();
    let source: Arc<dyn PosOrderSource> = pos.clone();
    let state = AppState::with_parts(
        Config::development(),
        repo.clone(),
        Some(marketplace),
        Some(source),
    );
    Harness {
        state,
        repo,
        lookup,
        pos,
    }
}
