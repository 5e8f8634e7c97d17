//! Source adapters: raw external payload → canonical [`Order`]
//!
//! | Adapter | source_system | source_type |
//! |---------|---------------|-------------|
//! | [`PosAdapter`] | POS | pos_export |
//! | [`MarketplaceAdapter::webhook`] | MARKETPLACE | webhook |
//! | [`MarketplaceAdapter::manual_import`] | MARKETPLACE | manual_import |

pub mod envelope;
pub mod marketplace;
pub mod pos;

pub use envelope::{Envelope, extract_records, notification_entity_id};
pub use marketplace::MarketplaceAdapter;
pub use pos::PosAdapter;

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use shared::{Order, SourceSystem, SourceType};

use crate::error::{IngestError, IngestResult};
use crate::normalize::money;

/// One raw record → one canonical order (line items included)
pub trait SourceAdapter: Send + Sync {
    fn source_system(&self) -> SourceSystem;

    fn source_type(&self) -> SourceType;

    fn normalize(&self, raw: &Value) -> IngestResult<Order>;

    /// Best-effort identity of a raw record, for failure reports
    fn reference(&self, raw: &Value) -> Option<String>;
}

// ========== JSON field helpers ==========

/// Non-empty trimmed string; numbers are stringified
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn required_str(value: &Value, key: &str) -> IngestResult<String> {
    str_field(value, key).ok_or_else(|| IngestError::missing(key))
}

pub(crate) fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Array field, empty when absent or not an array
pub(crate) fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Decimal currency from a JSON number or numeric string
pub(crate) fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().map(money::to_decimal)),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

pub(crate) fn decimal_field(value: &Value, key: &str) -> Option<Decimal> {
    value.get(key).and_then(decimal_value)
}

/// Positive integer (headcount, guest count); `<= 0` is treated as absent
pub(crate) fn positive_count(value: &Value, key: &str) -> Option<u32> {
    let n = match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|n| *n > 0)
}

/// Line-item quantity as given by the source; must be positive
///
/// Weighted POS items carry fractional quantities (`1.5`).
pub(crate) fn quantity_field(value: &Value, key: &str) -> IngestResult<Decimal> {
    let raw = value.get(key).ok_or_else(|| IngestError::missing("quantity"))?;
    match decimal_value(raw) {
        Some(q) if q > Decimal::ZERO => Ok(q.normalize()),
        Some(q) => Err(IngestError::adapter("quantity", format!("must be positive, got {q}"))),
        None => Err(IngestError::adapter("quantity", format!("not a number: {raw}"))),
    }
}

/// Sum of money amounts; overflow is an adapter error on `field`
pub(crate) fn sum_amounts<I>(field: &str, values: I) -> IngestResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    money::checked_total(values).ok_or_else(|| IngestError::adapter(field, "overflow"))
}

/// Join display parts, dropping empty ones
pub(crate) fn join_parts<I, S>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let joined = parts
        .into_iter()
        .flatten()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_str_field() {
        let v = json!({ "a": "  x ", "b": "", "c": 42, "d": null });
        assert_eq!(str_field(&v, "a").as_deref(), Some("x"));
        assert_eq!(str_field(&v, "b"), None);
        assert_eq!(str_field(&v, "c").as_deref(), Some("42"));
        assert_eq!(str_field(&v, "d"), None);
        assert_eq!(str_field(&v, "missing"), None);
    }

    #[test]
    fn test_decimal_value_avoids_float_noise() {
        assert_eq!(decimal_value(&json!(12.34)), Some(Decimal::new(1234, 2)));
        assert_eq!(decimal_value(&json!("7.5")), Some(Decimal::new(75, 1)));
        assert_eq!(decimal_value(&json!(true)), None);
    }

    #[test]
    fn test_positive_count() {
        let v = json!({ "a": 25, "b": 0, "c": -3, "d": "12" });
        assert_eq!(positive_count(&v, "a"), Some(25));
        assert_eq!(positive_count(&v, "b"), None);
        assert_eq!(positive_count(&v, "c"), None);
        assert_eq!(positive_count(&v, "d"), Some(12));
    }

    #[test]
    fn test_quantity_field() {
        let v = json!({ "a": 2, "b": 0, "c": 1.0, "d": 1.5, "e": "3", "f": -1, "g": "lots" });
        assert_eq!(quantity_field(&v, "a").unwrap(), Decimal::from(2));
        assert_eq!(quantity_field(&v, "c").unwrap(), Decimal::ONE);
        assert_eq!(quantity_field(&v, "d").unwrap(), Decimal::new(15, 1));
        assert_eq!(quantity_field(&v, "e").unwrap(), Decimal::from(3));
        for key in ["b", "f", "g", "missing"] {
            match quantity_field(&v, key) {
                Err(IngestError::Adapter { field, .. }) => assert_eq!(field, "quantity"),
                other => panic!("{key}: expected adapter error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_sum_amounts_overflow() {
        let big = Decimal::from_str("50000000000000000000000000000").unwrap();
        assert_eq!(
            sum_amounts("amount", [Decimal::ONE, Decimal::TWO]).unwrap(),
            Decimal::from(3)
        );
        match sum_amounts("amount", [big, big]) {
            Err(IngestError::Adapter { field, reason }) => {
                assert_eq!(field, "amount");
                assert_eq!(reason, "overflow");
            }
            other => panic!("expected adapter error, got {other:?}"),
        }
    }

    #[test]
    fn test_join_parts_drops_empty() {
        let joined = join_parts([Some("1 Main St"), Some(""), None, Some("Springfield")]);
        assert_eq!(joined.as_deref(), Some("1 Main St, Springfield"));
        assert_eq!(join_parts::<_, &str>([None, Some("  ")]), None);
    }
}
