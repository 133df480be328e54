//! Lifecycle error types.

use common::OrderId;
use domain::{CustomerId, OrderError, OrderStatus};
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur during lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No live order has this identifier.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A patch named a status outside the enumerated set.
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    /// The strict status policy refused the change.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Customer validation is enabled and the customer is unknown.
    #[error("Unknown customer: {0}")]
    UnknownCustomer(CustomerId),

    /// The order store failed.
    #[error("Order store error: {0}")]
    Persistence(#[from] StoreError),

    /// The inventory service failed.
    #[error("Inventory service error: {0}")]
    Inventory(String),

    /// The customer directory failed.
    #[error("Customer service error: {0}")]
    CustomerService(String),

    /// The event notifier could not accept an event.
    #[error("Event notifier error: {0}")]
    Notifier(String),
}

impl From<OrderError> for LifecycleError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidStatus { value } => LifecycleError::InvalidStatus(value),
            OrderError::InvalidTransition { from, to } => {
                LifecycleError::InvalidTransition { from, to }
            }
        }
    }
}

/// Convenience type alias for lifecycle results.
pub type Result<T> = std::result::Result<T, LifecycleError>;
