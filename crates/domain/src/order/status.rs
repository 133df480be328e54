//! Order status lifecycle.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The lifecycle status of an order.
///
/// Any status may follow any other under the default (permissive) policy.
/// The strict lifecycle, used only when explicitly enabled, is:
/// ```text
/// Pending ──┬──► Shipped ──► Completed
///           │
///           └──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order is recorded and stock has been reserved.
    #[default]
    Pending,

    /// Order has left the warehouse.
    Shipped,

    /// Order was canceled, either at creation or later (terminal under strict policy).
    Canceled,

    /// Order has been delivered (terminal under strict policy).
    Completed,
}

impl OrderStatus {
    /// Every status, in declaration order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Shipped,
        OrderStatus::Canceled,
        OrderStatus::Completed,
    ];

    /// Returns true if no further transitions are possible under the strict lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Canceled | OrderStatus::Completed)
    }

    /// Returns true if the strict lifecycle allows moving to `next`.
    ///
    /// Keeping the current status is always allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Shipped)
                | (OrderStatus::Pending, OrderStatus::Canceled)
                | (OrderStatus::Shipped, OrderStatus::Completed)
        )
    }

    /// Returns the status name as stored and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    /// Parses a status, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OrderError::InvalidStatus {
                value: s.to_string(),
            })
    }
}
