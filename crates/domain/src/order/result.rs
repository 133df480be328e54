//! Outcome of the create flow.

use common::OrderId;
use serde::Serialize;

use super::{CustomerId, LineItem, OrderStatus};

/// What the create flow reports back, whether the order was committed or canceled.
///
/// For a committed order the items are the persisted lines; for a canceled
/// one they carry the per-item reservation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub order_id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
}

impl OrderResult {
    /// A committed order.
    pub fn pending(order_id: OrderId, customer_id: Option<CustomerId>, items: Vec<LineItem>) -> Self {
        Self {
            order_id,
            customer_id,
            status: OrderStatus::Pending,
            items,
        }
    }

    /// An order rejected because stock could not be reserved.
    pub fn canceled(
        order_id: OrderId,
        customer_id: Option<CustomerId>,
        items: Vec<LineItem>,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            status: OrderStatus::Canceled,
            items,
        }
    }

    /// Returns true if the order was committed.
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}
