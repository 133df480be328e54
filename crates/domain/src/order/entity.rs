//! The canonical order entity and its lines.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId};
use serde::{Deserialize, Serialize};

use super::{CustomerId, OrderStatus, ProductId};

/// An order as persisted, hydrated with its items.
///
/// A row with `deleted = true` is a tombstone: it stays in storage but is
/// hidden from every normal read and update path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub status: OrderStatus,
    pub tracking_company: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_link: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Returns the writable fields of this order.
    pub fn fields(&self) -> OrderFields {
        OrderFields {
            customer_id: self.customer_id.clone(),
            status: self.status,
            tracking_company: self.tracking_company.clone(),
            tracking_number: self.tracking_number.clone(),
            tracking_link: self.tracking_link.clone(),
        }
    }

    /// Returns the number of persisted items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// The subset of order columns the update path is allowed to write.
///
/// Items, identity, the tombstone flag and the creation time are not writable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFields {
    pub customer_id: Option<CustomerId>,
    pub status: OrderStatus,
    pub tracking_company: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_link: Option<String>,
}

/// One persisted product-and-quantity line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub item_id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
}

impl OrderItem {
    /// Returns the line without its identity columns.
    pub fn to_line(&self) -> LineItem {
        LineItem::new(self.product_id.clone(), self.quantity)
    }
}

/// A requested line as it travels between the orchestrator and the
/// inventory collaborator.
///
/// `reserved` is transient: it is filled in by a reservation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved: Option<bool>,
}

impl LineItem {
    /// Creates a line with no reservation outcome yet.
    pub fn new(product_id: impl Into<ProductId>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            reserved: None,
        }
    }

    /// Returns a copy of this line carrying a reservation outcome.
    pub fn with_reservation(&self, reserved: bool) -> Self {
        Self {
            reserved: Some(reserved),
            ..self.clone()
        }
    }

    /// Returns true if the line was explicitly reserved.
    pub fn is_reserved(&self) -> bool {
        self.reserved == Some(true)
    }
}
