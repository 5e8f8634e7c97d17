//! Change-set produced by comparing an incoming order with the stored one

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 字段变更记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    /// Dotted field path, e.g. `customer.name`
    pub field: String,
    /// Stored value
    pub old: Value,
    /// Incoming value
    pub new: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChangeSet {
    pub is_new: bool,
    pub is_changed: bool,
    #[serde(default)]
    pub changed_fields: Vec<FieldChange>,
}

impl ChangeSet {
    /// No stored order: nothing to compare
    pub fn new_order() -> Self {
        Self {
            is_new: true,
            is_changed: false,
            changed_fields: Vec::new(),
        }
    }

    pub fn from_changes(changed_fields: Vec<FieldChange>) -> Self {
        Self {
            is_new: false,
            is_changed: !changed_fields.is_empty(),
            changed_fields,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        !self.is_new && !self.is_changed
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.changed_fields.iter().map(|c| c.field.as_str()).collect()
    }
}
