//! Webhook envelope extraction
//!
//! Deliveries arrive in several shapes. Each [`Envelope`] variant knows how
//! to recognise one shape and flatten it into candidate records; variants are
//! tried in [`EXTRACTORS`] order and the first match wins.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{data: {order: {...}}}` (direct GraphQL query result)
    DataOrder,
    /// `[{...}, ...]`
    BareArray,
    /// `{resource: {defaultDatasetItems: [...]}}`
    DatasetItems,
    /// `{items: [...]}`
    Items,
    /// A bare order object carrying `uuid`
    SingleRecord,
}

/// Extraction order
pub const EXTRACTORS: &[Envelope] = &[
    Envelope::DataOrder,
    Envelope::BareArray,
    Envelope::DatasetItems,
    Envelope::Items,
    Envelope::SingleRecord,
];

impl Envelope {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DataOrder => "data_order",
            Self::BareArray => "bare_array",
            Self::DatasetItems => "dataset_items",
            Self::Items => "items",
            Self::SingleRecord => "single_record",
        }
    }

    /// Candidate records if `payload` has this shape
    pub fn extract(&self, payload: &Value) -> Option<Vec<Value>> {
        match self {
            Self::DataOrder => payload
                .get("data")?
                .get("order")
                .filter(|o| o.is_object())
                .map(|o| vec![o.clone()]),
            Self::BareArray => payload.as_array().cloned(),
            Self::DatasetItems => payload
                .get("resource")?
                .get("defaultDatasetItems")?
                .as_array()
                .cloned(),
            Self::Items => payload.get("items")?.as_array().cloned(),
            Self::SingleRecord => payload
                .get("uuid")
                .filter(|_| payload.is_object())
                .map(|_| vec![payload.clone()]),
        }
    }
}

/// Flatten any known envelope into a list of raw records
pub fn extract_records(payload: &Value) -> Option<(Envelope, Vec<Value>)> {
    EXTRACTORS
        .iter()
        .find_map(|env| env.extract(payload).map(|records| (*env, records)))
}

/// Entity id of an event notification that carries no order body
///
/// Recognises `entityId` / `entity_id` at the top level or under `data`.
pub fn notification_entity_id(payload: &Value) -> Option<String> {
    let lookup = |v: &Value| {
        ["entityId", "entity_id"]
            .iter()
            .find_map(|k| v.get(*k))
            .and_then(|id| match id {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    };
    lookup(payload).or_else(|| payload.get("data").and_then(lookup))
}
