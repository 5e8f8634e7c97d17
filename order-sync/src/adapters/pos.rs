//! POS order adapter
//!
//! Input records come from the bulk export, already list-shaped. Money is
//! decimal currency and is summed across the non-deleted checks of an order.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde_json::Value;
use shared::{
    Customer, Financial, Fulfillment, FulfillmentType, LineItem, Modifier, Order, OrderStatus,
    SourceSystem, SourceType,
};

use super::{
    SourceAdapter, array_field, bool_field, decimal_field, join_parts, positive_count,
    quantity_field, required_str, str_field, sum_amounts,
};
use crate::error::{IngestError, IngestResult};
use crate::normalize::{money, time};

#[derive(Debug, Clone)]
pub struct PosAdapter {
    tz: Tz,
}

impl PosAdapter {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl SourceAdapter for PosAdapter {
    fn source_system(&self) -> SourceSystem {
        SourceSystem::Pos
    }

    fn source_type(&self) -> SourceType {
        SourceType::PosExport
    }

    fn normalize(&self, raw: &Value) -> IngestResult<Order> {
        if !raw.is_object() {
            return Err(IngestError::adapter("order", "record is not an object"));
        }
        let external_order_id = required_str(raw, "guid")?;
        let order_number = required_str(raw, "displayNumber")?;

        // 已删除/作废的账单不计入
        let checks: Vec<&Value> = array_field(raw, "checks")
            .iter()
            .filter(|c| !bool_field(c, "deleted") && !bool_field(c, "voided"))
            .collect();

        let status = if bool_field(raw, "voided") {
            OrderStatus::Cancelled
        } else {
            str_field(raw, "approvalStatus")
                .map(|label| OrderStatus::from_lifecycle(&label))
                .unwrap_or_default()
        };

        let mut line_items = Vec::new();
        for check in &checks {
            for selection in array_field(check, "selections") {
                if bool_field(selection, "voided") {
                    continue;
                }
                line_items.push(line_item(selection)?);
            }
        }

        Ok(Order {
            id: None,
            source_system: SourceSystem::Pos,
            source_type: SourceType::PosExport,
            external_order_id,
            order_number,
            customer: customer(raw, &checks),
            fulfillment: self.fulfillment(raw),
            headcount: positive_count(raw, "numberOfGuests"),
            financial: financial(&checks)?,
            status,
            raw_payload: raw.clone(),
            placed_at: str_field(raw, "openedDate").and_then(|s| time::parse_instant(&s)),
            last_synced_at: None,
            line_items,
        })
    }

    fn reference(&self, raw: &Value) -> Option<String> {
        str_field(raw, "guid").or_else(|| str_field(raw, "displayNumber"))
    }
}

impl PosAdapter {
    fn fulfillment(&self, raw: &Value) -> Fulfillment {
        let instant = str_field(raw, "promisedDate")
            .and_then(|s| time::parse_instant(&s))
            .or_else(|| str_field(raw, "openedDate").and_then(|s| time::parse_instant(&s)));

        let (date, time) = match instant {
            Some(at) => {
                let (d, t) = time::to_business(at, self.tz);
                (Some(d), Some(t))
            }
            None => (
                str_field(raw, "businessDate").and_then(|s| time::parse_business_date(&s)),
                None,
            ),
        };

        let kind = match raw
            .get("diningOption")
            .and_then(|d| str_field(d, "behavior"))
        {
            Some(b) if b.eq_ignore_ascii_case("DELIVERY") => FulfillmentType::Delivery,
            _ => FulfillmentType::Pickup,
        };

        let delivery = raw.get("deliveryInfo");
        let address = delivery.and_then(|d| {
            join_parts([
                str_field(d, "address1"),
                str_field(d, "address2"),
                str_field(d, "city"),
                str_field(d, "state"),
                str_field(d, "zipCode"),
            ])
        });

        Fulfillment {
            kind,
            date,
            time,
            address,
            notes: delivery.and_then(|d| str_field(d, "notes")),
        }
    }
}

/// Order-level customer, else the first check that carries one
fn customer(raw: &Value, checks: &[&Value]) -> Customer {
    let source = raw
        .get("customer")
        .filter(|c| c.is_object())
        .or_else(|| {
            checks
                .iter()
                .find_map(|c| c.get("customer").filter(|c| c.is_object()))
        });
    let Some(c) = source else {
        return Customer::default();
    };

    let first = str_field(c, "firstName").unwrap_or_default();
    let last = str_field(c, "lastName").unwrap_or_default();
    let name = format!("{first} {last}").trim().to_string();
    Customer {
        name: (!name.is_empty()).then_some(name),
        email: str_field(c, "email"),
        phone: str_field(c, "phone"),
    }
}

fn financial(checks: &[&Value]) -> IngestResult<Financial> {
    let sum = |key: &str| -> IngestResult<Decimal> {
        sum_amounts(key, checks.iter().filter_map(|c| decimal_field(c, key)))
    };

    let tip = sum_amounts(
        "tipAmount",
        checks
            .iter()
            .flat_map(|c| array_field(c, "payments"))
            .filter(|p| !bool_field(p, "voided"))
            .filter_map(|p| decimal_field(p, "tipAmount")),
    )?;

    let fees: Vec<Decimal> = checks
        .iter()
        .filter_map(|c| decimal_field(c, "deliveryFee"))
        .collect();
    let delivery_fee = if fees.is_empty() {
        None
    } else {
        Some(sum_amounts("deliveryFee", fees)?)
    };

    Ok(Financial {
        subtotal: sum("amount")?,
        tax: sum("taxAmount")?,
        tip,
        delivery_fee,
        total: sum("totalAmount")?,
    })
}

fn line_item(selection: &Value) -> IngestResult<LineItem> {
    let name = required_str(selection, "displayName")?;
    let quantity = quantity_field(selection, "quantity")?;

    // `price` is the selection total as rung up
    let total_price = decimal_field(selection, "price").unwrap_or_default();
    let unit_price = match decimal_field(selection, "unitPrice") {
        Some(unit) => unit,
        None => total_price
            .checked_div(quantity)
            .map(money::round_currency)
            .ok_or_else(|| IngestError::adapter("price", "overflow"))?,
    };

    let modifiers = array_field(selection, "modifiers")
        .iter()
        .filter(|m| !bool_field(m, "voided"))
        .filter_map(|m| {
            let name = str_field(m, "displayName")?;
            let quantity = m
                .get("quantity")
                .and_then(Value::as_f64)
                .map(|q| q.round() as i32)
                .filter(|q| *q > 0)
                .unwrap_or(1);
            Some(Modifier { name, quantity })
        })
        .collect();

    Ok(LineItem {
        item_ref: str_field(selection, "guid"),
        name,
        quantity,
        unit_price,
        total_price,
        modifiers,
        special_request: str_field(selection, "specialRequest"),
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

    fn adapter() -> PosAdapter {
        PosAdapter::new(chrono_tz::America::New_York)
    }

    fn record() -> Value {
        json!({
            "guid": "pos-guid-1",
            "displayNumber": "0042",
            "openedDate": "2024-03-14T20:05:00.000+0000",
            "promisedDate": "2024-03-15T16:30:00.000+0000",
            "businessDate": 20240314,
            "approvalStatus": "APPROVED",
            "numberOfGuests": 40,
            "diningOption": { "behavior": "DELIVERY" },
            "deliveryInfo": {
                "address1": "1 Beacon St",
                "address2": "Floor 3",
                "city": "Boston",
                "state": "MA",
                "zipCode": "02108",
                "notes": "Ask for front desk"
            },
            "checks": [
                {
                    "amount": 210.50,
                    "taxAmount": 13.16,
                    "totalAmount": 263.66,
                    "deliveryFee": 15.00,
                    "customer": {
                        "firstName": "Lee",
                        "lastName": "Park",
                        "email": "lee@example.com",
                        "phone": "555-0199"
                    },
                    "payments": [
                        { "tipAmount": 25.00 },
                        { "tipAmount": 5.00, "voided": true }
                    ],
                    "selections": [
                        {
                            "guid": "sel-1",
                            "displayName": "Sandwich Platter",
                            "quantity": 2,
                            "price": 180.50,
                            "unitPrice": 90.25,
                            "modifiers": [{ "displayName": "Gluten free bread", "quantity": 1 }],
                            "specialRequest": "Cut in halves"
                        },
                        {
                            "guid": "sel-2",
                            "displayName": "Cookies",
                            "quantity": 3,
                            "price": 30.00
                        },
                        {
                            "guid": "sel-3",
                            "displayName": "Rung by mistake",
                            "quantity": 1,
                            "price": 99.00,
                            "voided": true
                        }
                    ]
                },
                {
                    "amount": 500.00,
                    "totalAmount": 500.00,
                    "deleted": true,
                    "selections": [{ "displayName": "Ghost", "quantity": 1, "price": 500.00 }]
                }
            ]
        })
    }

    #[test]
    fn test_normalize_record() {
        let order = adapter().normalize(&record()).unwrap();

        assert_eq!(order.source_system, SourceSystem::Pos);
        assert_eq!(order.source_type, SourceType::PosExport);
        assert_eq!(order.external_order_id, "pos-guid-1");
        assert_eq!(order.order_number, "0042");
        assert_eq!(order.headcount, Some(40));
        assert_eq!(order.status, OrderStatus::Pending);

        assert_eq!(order.customer.name.as_deref(), Some("Lee Park"));
        assert_eq!(order.fulfillment.kind, FulfillmentType::Delivery);
        assert_eq!(
            order.fulfillment.address.as_deref(),
            Some("1 Beacon St, Floor 3, Boston, MA, 02108")
        );
        assert_eq!(order.fulfillment.notes.as_deref(), Some("Ask for front desk"));
        // promisedDate 16:30 UTC → 12:30 EDT
        assert_eq!(order.fulfillment.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(order.fulfillment.time, NaiveTime::from_hms_opt(12, 30, 0));
    }

    #[test]
    fn test_money_skips_deleted_checks_and_voided_payments() {
        let order = adapter().normalize(&record()).unwrap();
        assert_eq!(order.financial.subtotal, dec("210.50"));
        assert_eq!(order.financial.tax, dec("13.16"));
        assert_eq!(order.financial.tip, dec("25.00"));
        assert_eq!(order.financial.delivery_fee, Some(dec("15.00")));
        assert_eq!(order.financial.total, dec("263.66"));
    }

    #[test]
    fn test_line_items_skip_voided_selections() {
        let order = adapter().normalize(&record()).unwrap();
        let names: Vec<_> = order.line_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Sandwich Platter", "Cookies"]);

        let platter = &order.line_items[0];
        assert_eq!(platter.unit_price, dec("90.25"));
        assert_eq!(platter.total_price, dec("180.50"));
        assert_eq!(platter.modifiers[0].name, "Gluten free bread");

        let cookies = &order.line_items[1];
        assert_eq!(cookies.unit_price, dec("10.00"));
        assert_eq!(cookies.total_price, dec("30.00"));
    }

    #[test]
    fn test_voided_order_is_cancelled() {
        let mut raw = record();
        raw["voided"] = json!(true);
        assert_eq!(adapter().normalize(&raw).unwrap().status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_business_date_fallback() {
        let mut raw = record();
        let obj = raw.as_object_mut().unwrap();
        obj.remove("promisedDate");
        obj.remove("openedDate");
        let order = adapter().normalize(&raw).unwrap();
        assert_eq!(order.fulfillment.date, NaiveDate::from_ymd_opt(2024, 3, 14));
        assert_eq!(order.fulfillment.time, None);
        assert_eq!(order.placed_at, None);
    }

    #[test]
    fn test_missing_guid() {
        let mut raw = record();
        raw.as_object_mut().unwrap().remove("guid");
        match adapter().normalize(&raw) {
            Err(IngestError::Adapter { field, .. }) => assert_eq!(field, "guid"),
            other => panic!("expected adapter error, got {other:?}"),
        }
        assert_eq!(adapter().reference(&raw).as_deref(), Some("0042"));
    }

    #[test]
    fn test_pickup_without_checks() {
        let order = adapter()
            .normalize(&json!({
                "guid": "g",
                "displayNumber": "7",
                "diningOption": { "behavior": "TAKE_OUT" }
            }))
            .unwrap();
        assert_eq!(order.fulfillment.kind, FulfillmentType::Pickup);
        assert_eq!(order.financial.total, Decimal::ZERO);
        assert_eq!(order.financial.delivery_fee, None);
        assert_eq!(order.customer, Customer::default());
    }

    #[test]
    fn test_fractional_quantity_kept_as_given() {
        let mut raw = record();
        raw["checks"][0]["selections"][1] = json!({
            "guid": "sel-w",
            "displayName": "Brisket (lb)",
            "quantity": 1.5,
            "price": 27.00
        });
        let order = adapter().normalize(&raw).unwrap();
        let brisket = &order.line_items[1];
        assert_eq!(brisket.quantity, dec("1.5"));
        assert_eq!(brisket.unit_price, dec("18.00"));
        assert_eq!(brisket.total_price, dec("27.00"));
    }

    #[test]
    fn test_amount_overflow_is_adapter_error() {
        let check = json!({ "amount": "50000000000000000000000000000", "totalAmount": 1 });
        let raw = json!({
            "guid": "g-big",
            "displayNumber": "9",
            "checks": [check.clone(), check]
        });
        match adapter().normalize(&raw) {
            Err(IngestError::Adapter { field, reason }) => {
                assert_eq!(field, "amount");
                assert_eq!(reason, "overflow");
            }
            other => panic!("expected adapter error, got {other:?}"),
        }
    }
}
