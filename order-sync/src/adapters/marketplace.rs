//! Marketplace order adapter (webhook + manual import)
//!
//! Money arrives as `{subunits, currency}` and is converted with
//! [`money::from_subunits`]. Fulfillment time prefers
//! `event.catererHandoffFoodTime` over `event.timestamp`.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde_json::Value;
use shared::{
    Customer, Financial, Fulfillment, FulfillmentType, LineItem, Modifier, Order, OrderStatus,
    SourceSystem, SourceType,
};

use super::{
    SourceAdapter, array_field, join_parts, positive_count, quantity_field, required_str,
    str_field, sum_amounts,
};
use crate::error::{IngestError, IngestResult};
use crate::normalize::{money, time};

#[derive(Debug, Clone)]
pub struct MarketplaceAdapter {
    source_type: SourceType,
    tz: Tz,
}

impl MarketplaceAdapter {
    /// Automatic webhook delivery
    pub fn webhook(tz: Tz) -> Self {
        Self {
            source_type: SourceType::Webhook,
            tz,
        }
    }

    /// Operator-triggered import; same payload, different provenance tag
    pub fn manual_import(tz: Tz) -> Self {
        Self {
            source_type: SourceType::ManualImport,
            tz,
        }
    }
}

impl SourceAdapter for MarketplaceAdapter {
    fn source_system(&self) -> SourceSystem {
        SourceSystem::Marketplace
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn normalize(&self, raw: &Value) -> IngestResult<Order> {
        if !raw.is_object() {
            return Err(IngestError::adapter("order", "record is not an object"));
        }
        let external_order_id = required_str(raw, "uuid")?;
        let order_number = required_str(raw, "orderNumber")?;

        let empty = Value::Null;
        let event = raw.get("event").unwrap_or(&empty);

        let status = str_field(raw, "status")
            .or_else(|| str_field(raw, "orderStatus"))
            .map(|label| OrderStatus::from_lifecycle(&label))
            .unwrap_or_default();

        let line_items = array_field(raw.get("catererCart").unwrap_or(&empty), "orderItems")
            .iter()
            .map(line_item)
            .collect::<IngestResult<Vec<_>>>()?;

        Ok(Order {
            id: None,
            source_system: SourceSystem::Marketplace,
            source_type: self.source_type,
            external_order_id,
            order_number,
            customer: customer(raw.get("orderCustomer").unwrap_or(&empty)),
            fulfillment: self.fulfillment(raw, event),
            headcount: positive_count(event, "headcount"),
            financial: financial(raw.get("totals").unwrap_or(&empty))?,
            status,
            raw_payload: raw.clone(),
            placed_at: str_field(raw, "createdAt").and_then(|s| time::parse_instant(&s)),
            last_synced_at: None,
            line_items,
        })
    }

    fn reference(&self, raw: &Value) -> Option<String> {
        str_field(raw, "uuid").or_else(|| str_field(raw, "orderNumber"))
    }
}

impl MarketplaceAdapter {
    fn fulfillment(&self, raw: &Value, event: &Value) -> Fulfillment {
        // 交接时间比事件时间更准确
        let instant = event
            .get("catererHandoffFoodTime")
            .and_then(time::parse_instant_value)
            .or_else(|| event.get("timestamp").and_then(time::parse_instant_value));
        let (date, time) = match instant {
            Some(at) => {
                let (d, t) = time::to_business(at, self.tz);
                (Some(d), Some(t))
            }
            None => (None, None),
        };

        let address = event.get("address").and_then(|a| {
            join_parts([
                str_field(a, "street"),
                str_field(a, "street2"),
                str_field(a, "city"),
                str_field(a, "state"),
                str_field(a, "zip"),
            ])
        });

        let kind = match str_field(event, "orderType") {
            Some(t) if t.to_lowercase().contains("deliver") => FulfillmentType::Delivery,
            Some(_) => FulfillmentType::Pickup,
            None if address.is_some() => FulfillmentType::Delivery,
            None => FulfillmentType::Pickup,
        };

        Fulfillment {
            kind,
            date,
            time,
            address,
            notes: str_field(event, "deliveryInstructions")
                .or_else(|| str_field(raw, "specialInstructions")),
        }
    }
}

fn customer(c: &Value) -> Customer {
    let name = str_field(c, "fullName").or_else(|| {
        let first = str_field(c, "firstName").unwrap_or_default();
        let last = str_field(c, "lastName").unwrap_or_default();
        let full = format!("{first} {last}").trim().to_string();
        (!full.is_empty()).then_some(full)
    });
    Customer {
        name,
        email: str_field(c, "email"),
        phone: str_field(c, "phone"),
    }
}

/// `{subunits, currency}` or a bare integer of subunits
fn subunits(value: Option<&Value>) -> Option<Decimal> {
    let v = value?;
    let units = match v {
        Value::Object(_) => v.get("subunits")?.as_i64()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    Some(money::from_subunits(units))
}

fn financial(totals: &Value) -> IngestResult<Financial> {
    let subtotal = subunits(totals.get("subTotal")).unwrap_or_default();
    let tax = subunits(totals.get("salesTax")).unwrap_or_default();
    let tip = subunits(totals.get("tip")).unwrap_or_default();
    let delivery_fee = subunits(totals.get("deliveryFee"));
    let total = match subunits(totals.get("customerTotalDue")) {
        Some(total) => total,
        None => sum_amounts(
            "totals",
            [subtotal, tax, tip, delivery_fee.unwrap_or_default()],
        )?,
    };

    Ok(Financial {
        subtotal,
        tax,
        tip,
        delivery_fee,
        total,
    })
}

fn line_item(item: &Value) -> IngestResult<LineItem> {
    let name = required_str(item, "name")?;
    let quantity = quantity_field(item, "quantity")?;
    let overflow = || IngestError::adapter("unitPrice", "overflow");

    let unit = subunits(item.get("unitPrice"));
    let total = subunits(item.get("totalInSubunits"));
    let (unit_price, total_price) = match (unit, total) {
        (Some(u), Some(t)) => (u, t),
        (Some(u), None) => (u, u.checked_mul(quantity).ok_or_else(overflow)?),
        (None, Some(t)) => (
            t.checked_div(quantity)
                .map(money::round_currency)
                .ok_or_else(overflow)?,
            t,
        ),
        (None, None) => (Decimal::ZERO, Decimal::ZERO),
    };

    let modifiers = array_field(item, "customizations")
        .iter()
        .filter_map(|c| {
            let name = str_field(c, "name")?;
            let quantity = c
                .get("quantity")
                .and_then(Value::as_i64)
                .and_then(|q| i32::try_from(q).ok())
                .unwrap_or(1);
            Some(Modifier { name, quantity })
        })
        .collect();

    Ok(LineItem {
        item_ref: str_field(item, "uuid"),
        name,
        quantity,
        unit_price,
        total_price,
        modifiers,
        special_request: str_field(item, "specialInstructions"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn adapter() -> MarketplaceAdapter {
        MarketplaceAdapter::webhook(chrono_tz::America::New_York)
    }

    fn payload() -> Value {
        json!({
            "uuid": "9f1c-uuid",
            "orderNumber": "XK4-221",
            "status": "Confirmed",
            "createdAt": "2024-03-10T14:00:00Z",
            "event": {
                "timestamp": "2024-03-15T16:00:00Z",
                "catererHandoffFoodTime": "2024-03-15T15:45:00Z",
                "orderType": "DELIVERY",
                "headcount": 25,
                "deliveryInstructions": "Loading dock B",
                "address": {
                    "street": "100 Main St",
                    "street2": "",
                    "city": "Boston",
                    "state": "MA",
                    "zip": "02110"
                }
            },
            "orderCustomer": {
                "firstName": "Dana",
                "lastName": "Reyes",
                "email": "dana@example.com",
                "phone": "555-0100"
            },
            "totals": {
                "subTotal": { "subunits": 30000, "currency": "USD" },
                "salesTax": { "subunits": 1875, "currency": "USD" },
                "tip": { "subunits": 4500, "currency": "USD" },
                "deliveryFee": { "subunits": 2500, "currency": "USD" },
                "customerTotalDue": { "subunits": 38875, "currency": "USD" }
            },
            "catererCart": {
                "orderItems": [
                    {
                        "uuid": "item-1",
                        "name": "Burrito Bar",
                        "quantity": 25,
                        "unitPrice": { "subunits": 1200, "currency": "USD" },
                        "totalInSubunits": { "subunits": 30000, "currency": "USD" },
                        "customizations": [
                            { "name": "Extra guac", "quantity": 2 },
                            { "name": "No onions" }
                        ],
                        "specialInstructions": "Label vegetarian"
                    }
                ]
            }
        })
    }

    #[test]
    fn test_normalize_full_payload() {
        let order = adapter().normalize(&payload()).unwrap();

        assert_eq!(order.source_system, SourceSystem::Marketplace);
        assert_eq!(order.source_type, SourceType::Webhook);
        assert_eq!(order.external_order_id, "9f1c-uuid");
        assert_eq!(order.order_number, "XK4-221");
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.headcount, Some(25));

        assert_eq!(order.customer.name.as_deref(), Some("Dana Reyes"));
        assert_eq!(order.customer.email.as_deref(), Some("dana@example.com"));

        assert_eq!(order.fulfillment.kind, FulfillmentType::Delivery);
        assert_eq!(
            order.fulfillment.address.as_deref(),
            Some("100 Main St, Boston, MA, 02110")
        );
        assert_eq!(order.fulfillment.notes.as_deref(), Some("Loading dock B"));

        assert_eq!(order.financial.subtotal, dec("300.00"));
        assert_eq!(order.financial.tax, dec("18.75"));
        assert_eq!(order.financial.tip, dec("45.00"));
        assert_eq!(order.financial.delivery_fee, Some(dec("25.00")));
        assert_eq!(order.financial.total, dec("388.75"));

        assert_eq!(order.line_items.len(), 1);
        let item = &order.line_items[0];
        assert_eq!(item.item_ref.as_deref(), Some("item-1"));
        assert_eq!(item.quantity, Decimal::from(25));
        assert_eq!(item.unit_price, dec("12.00"));
        assert_eq!(item.total_price, dec("300.00"));
        assert_eq!(item.modifiers.len(), 2);
        assert_eq!(item.modifiers[1].quantity, 1);
        assert_eq!(item.special_request.as_deref(), Some("Label vegetarian"));

        assert_eq!(order.raw_payload, payload());
    }

    #[test]
    fn test_handoff_time_preferred_over_event_timestamp() {
        let order = adapter().normalize(&payload()).unwrap();
        // 15:45 UTC = 11:45 EDT
        assert_eq!(order.fulfillment.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(order.fulfillment.time, NaiveTime::from_hms_opt(11, 45, 0));

        let mut raw = payload();
        raw["event"]
            .as_object_mut()
            .unwrap()
            .remove("catererHandoffFoodTime");
        let order = adapter().normalize(&raw).unwrap();
        assert_eq!(order.fulfillment.time, NaiveTime::from_hms_opt(12, 0, 0));
    }

    #[test]
    fn test_total_falls_back_to_sum() {
        let mut raw = payload();
        raw["totals"]
            .as_object_mut()
            .unwrap()
            .remove("customerTotalDue");
        let order = adapter().normalize(&raw).unwrap();
        assert_eq!(order.financial.total, dec("388.75"));
    }

    #[test]
    fn test_missing_identity() {
        for field in ["uuid", "orderNumber"] {
            let mut raw = payload();
            raw.as_object_mut().unwrap().remove(field);
            match adapter().normalize(&raw) {
                Err(IngestError::Adapter { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected adapter error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut raw = payload();
        raw["catererCart"]["orderItems"][0]["quantity"] = json!(0);
        match adapter().normalize(&raw) {
            Err(IngestError::Adapter { field, .. }) => assert_eq!(field, "quantity"),
            other => panic!("expected adapter error, got {other:?}"),
        }
    }

    #[test]
    fn test_line_total_overflow_is_adapter_error() {
        let mut raw = payload();
        let item = &mut raw["catererCart"]["orderItems"][0];
        item["quantity"] = json!("50000000000000000000000000");
        item["unitPrice"] = json!({ "subunits": i64::MAX, "currency": "USD" });
        item.as_object_mut().unwrap().remove("totalInSubunits");
        match adapter().normalize(&raw) {
            Err(IngestError::Adapter { field, reason }) => {
                assert_eq!(field, "unitPrice");
                assert_eq!(reason, "overflow");
            }
            other => panic!("expected adapter error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_headcount_is_absent() {
        let mut raw = payload();
        raw["event"]["headcount"] = json!(0);
        assert_eq!(adapter().normalize(&raw).unwrap().headcount, None);
    }

    #[test]
    fn test_manual_import_changes_type_not_identity() {
        let tz = chrono_tz::America::New_York;
        let a = MarketplaceAdapter::webhook(tz).normalize(&payload()).unwrap();
        let b = MarketplaceAdapter::manual_import(tz)
            .normalize(&payload())
            .unwrap();
        assert_eq!(b.source_type, SourceType::ManualImport);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_minimal_record() {
        let order = adapter()
            .normalize(&json!({ "uuid": "u-2", "orderNumber": 77 }))
            .unwrap();
        assert_eq!(order.order_number, "77");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.fulfillment.kind, FulfillmentType::Pickup);
        assert_eq!(order.fulfillment.date, None);
        assert_eq!(order.financial.total, Decimal::ZERO);
        assert!(order.line_items.is_empty());
    }
}
