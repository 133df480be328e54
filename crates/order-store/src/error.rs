use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An item referenced an order that does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A stored row could not be turned back into a domain value.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// The store refused the operation (connectivity, injected failure).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
