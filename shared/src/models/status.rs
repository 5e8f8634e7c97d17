//! Order status and lifecycle-label mapping
//!
//! ```text
//! PENDING → CONFIRMED → IN_PROGRESS → DELIVERED
//!    └──────────┴────────────┴──────→ CANCELLED
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    InProgress,
    Delivered,
    Cancelled,
}

/// Substring → status, evaluated top to bottom. First match wins.
const LIFECYCLE_TABLE: &[(&str, OrderStatus)] = &[
    ("cancel", OrderStatus::Cancelled),
    ("deliver", OrderStatus::Delivered),
    ("confirm", OrderStatus::Confirmed),
    ("progress", OrderStatus::InProgress),
];

impl OrderStatus {
    /// Map a source lifecycle label onto a status. Total: unknown → Pending.
    pub fn from_lifecycle(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        LIFECYCLE_TABLE
            .iter()
            .find(|(needle, _)| normalized.contains(needle))
            .map(|(_, status)| *status)
            .unwrap_or(OrderStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::InProgress => "IN_PROGRESS",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Position along the forward path; Cancelled sits past Delivered
    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::InProgress => 2,
            Self::Delivered => 3,
            Self::Cancelled => 4,
        }
    }

    /// Whether moving `self → next` walks the state machine backwards
    ///
    /// Leaving a terminal state for anything else counts as a regression
    /// (a re-opened cancelled order included).
    pub fn is_regression(&self, next: OrderStatus) -> bool {
        if *self == next {
            return false;
        }
        if self.is_terminal() {
            return true;
        }
        next != Self::Cancelled && next.rank() < self.rank()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}
