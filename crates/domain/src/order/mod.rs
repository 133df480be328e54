//! Order entity and related types.

mod entity;
mod requests;
mod result;
mod status;
mod value_objects;

pub use entity::{LineItem, Order, OrderFields, OrderItem};
pub use requests::{CreateOrderRequest, OrderPatch};
pub use result::OrderResult;
pub use status::OrderStatus;
pub use value_objects::{CustomerId, ProductId};

use thiserror::Error;

/// Errors that can occur when validating order input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Status value is not one of the enumerated statuses.
    #[error("Invalid order status: {value}")]
    InvalidStatus { value: String },

    /// Status change is not allowed by the strict lifecycle.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}
