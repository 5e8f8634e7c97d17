//! Canonical Order Model

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::status::OrderStatus;

/// Upstream platform that produced an order (part of the identity key)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceSystem {
    Pos,
    Marketplace,
}

impl SourceSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pos => "POS",
            Self::Marketplace => "MARKETPLACE",
        }
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POS" => Ok(Self::Pos),
            "MARKETPLACE" => Ok(Self::Marketplace),
            other => Err(format!("unknown source system: {other}")),
        }
    }
}

/// Ingestion channel provenance (audit only, never part of identity)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// POS batch export / polling
    PosExport,
    /// Marketplace webhook delivery
    Webhook,
    /// Operator-triggered marketplace import
    ManualImport,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PosExport => "pos_export",
            Self::Webhook => "webhook",
            Self::ManualImport => "manual_import",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pos_export" => Ok(Self::PosExport),
            "webhook" => Ok(Self::Webhook),
            "manual_import" => Ok(Self::ManualImport),
            other => Err(format!("unknown source type: {other}")),
        }
    }
}

/// Pickup or delivery
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentType {
    #[default]
    Pickup,
    Delivery,
}

impl FulfillmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "PICKUP",
            Self::Delivery => "DELIVERY",
        }
    }
}

impl FromStr for FulfillmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PICKUP" => Ok(Self::Pickup),
            "DELIVERY" => Ok(Self::Delivery),
            other => Err(format!("unknown fulfillment type: {other}")),
        }
    }
}

/// Customer contact (every field optional)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Customer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// When/where the order is handed over
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Fulfillment {
    #[serde(rename = "type")]
    pub kind: FulfillmentType,
    /// Business date in the configured business timezone
    pub date: Option<NaiveDate>,
    /// Local time of day (minute resolution)
    pub time: Option<NaiveTime>,
    /// Display address, parts joined by ", "
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Order money, in currency units
///
/// `total` is authoritative; the other fields are informational.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Financial {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub tip: Decimal,
    pub delivery_fee: Option<Decimal>,
    pub total: Decimal,
}

/// Line item modifier (customization)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
    pub quantity: i32,
}

/// Line item, owned by exactly one order
///
/// `quantity` and `total_price` are stored as delivered by the source;
/// quantities may be fractional (weighted items) and the total is never
/// recomputed from `quantity * unit_price`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub item_ref: Option<String>,
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_request: Option<String>,
}

/// Canonical order, unique per `(source_system, external_order_id)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Store-assigned internal id (None until persisted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub source_system: SourceSystem,
    pub source_type: SourceType,
    pub external_order_id: String,
    pub order_number: String,
    pub customer: Customer,
    pub fulfillment: Fulfillment,
    pub headcount: Option<u32>,
    pub financial: Financial,
    pub status: OrderStatus,
    /// Source document kept for audit/debug, never parsed downstream
    pub raw_payload: serde_json::Value,
    /// Source's self-reported placement time
    pub placed_at: Option<DateTime<Utc>>,
    /// Instant of the last successful write
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Order {
    /// Identity key `(source_system, external_order_id)`
    pub fn key(&self) -> (SourceSystem, &str) {
        (self.source_system, self.external_order_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_system_roundtrip() {
        for s in [SourceSystem::Pos, SourceSystem::Marketplace] {
            assert_eq!(s.as_str().parse::<SourceSystem>(), Ok(s));
        }
        assert!("TOAST".parse::<SourceSystem>().is_err());
    }

    #[test]
    fn test_source_type_serializes_snake_case() {
        let json = serde_json::to_string(&SourceType::ManualImport).unwrap();
        assert_eq!(json, "\"manual_import\"");
        assert_eq!("webhook".parse::<SourceType>(), Ok(SourceType::Webhook));
    }

    #[test]
    fn test_fulfillment_type_field_renamed() {
        let f = Fulfillment {
            kind: FulfillmentType::Delivery,
            ..Default::default()
        };
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["type"], "DELIVERY");
    }
}
