//! Change detection between an incoming order and the stored one
//!
//! Only the fields that matter for "does this need re-sync" are compared.
//! Line items and the raw payload are never part of the change-set.

use serde::Serialize;
use serde_json::Value;
use shared::{ChangeSet, FieldChange, Order};

use crate::normalize::money;

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

/// Exact comparison
fn compare<T: Serialize + PartialEq>(
    changes: &mut Vec<FieldChange>,
    field: &str,
    old: &T,
    new: &T,
) {
    if old != new {
        changes.push(FieldChange {
            field: field.to_string(),
            old: to_json(old),
            new: to_json(new),
        });
    }
}

/// `incoming` vs `stored`; `None` stored means a new order
pub fn diff(incoming: &Order, stored: Option<&Order>) -> ChangeSet {
    let Some(stored) = stored else {
        return ChangeSet::new_order();
    };

    let mut changes = Vec::new();
    let (old, new) = (stored, incoming);

    compare(&mut changes, "customer.name", &old.customer.name, &new.customer.name);
    compare(&mut changes, "customer.phone", &old.customer.phone, &new.customer.phone);
    compare(&mut changes, "customer.email", &old.customer.email, &new.customer.email);

    compare(&mut changes, "fulfillment.date", &old.fulfillment.date, &new.fulfillment.date);
    compare(&mut changes, "fulfillment.time", &old.fulfillment.time, &new.fulfillment.time);
    compare(
        &mut changes,
        "fulfillment.address",
        &old.fulfillment.address,
        &new.fulfillment.address,
    );
    compare(&mut changes, "fulfillment.notes", &old.fulfillment.notes, &new.fulfillment.notes);

    compare(&mut changes, "headcount", &old.headcount, &new.headcount);
    compare(&mut changes, "status", &old.status, &new.status);

    // 金额容差比较
    if !money::approx_eq(old.financial.total, new.financial.total) {
        changes.push(FieldChange {
            field: "financial.total".to_string(),
            old: to_json(&old.financial.total),
            new: to_json(&new.financial.total),
        });
    }

    ChangeSet::from_changes(changes)
}
