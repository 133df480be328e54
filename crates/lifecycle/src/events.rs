//! Lifecycle events announced after successful mutations.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

/// Topics an event can be published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderTopic {
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.updated")]
    OrderUpdated,
    #[serde(rename = "order.deleted")]
    OrderDeleted,
    #[serde(rename = "customer.updated")]
    CustomerUpdated,
}

impl OrderTopic {
    pub const ALL: [OrderTopic; 4] = [
        OrderTopic::OrderCreated,
        OrderTopic::OrderUpdated,
        OrderTopic::OrderDeleted,
        OrderTopic::CustomerUpdated,
    ];

    /// Returns the topic name as published.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderTopic::OrderCreated => "order.created",
            OrderTopic::OrderUpdated => "order.updated",
            OrderTopic::OrderDeleted => "order.deleted",
            OrderTopic::CustomerUpdated => "customer.updated",
        }
    }
}

impl std::fmt::Display for OrderTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of every lifecycle event: `{"orderId": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEventPayload {
    pub order_id: OrderId,
}

/// An event ready to hand to a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub topic: OrderTopic,
    pub payload: OrderEventPayload,
    pub occurred_at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn new(topic: OrderTopic, order_id: OrderId) -> Self {
        Self {
            topic,
            payload: OrderEventPayload { order_id },
            occurred_at: Utc::now(),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.payload.order_id
    }
}
