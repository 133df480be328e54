//! Domain layer for the order lifecycle service.
//!
//! This crate provides the canonical order model:
//! - `Order` and `OrderItem`, the persisted entity and its lines
//! - `OrderStatus`, the four-valued lifecycle status
//! - Per-operation shapes: `CreateOrderRequest`, `OrderPatch`, `OrderResult`
//! - `LineItem`, the in-flight line carrying the transient reservation flag

pub mod order;

pub use common::{OrderId, OrderItemId};
pub use order::{
    CreateOrderRequest, CustomerId, LineItem, Order, OrderError, OrderFields, OrderItem,
    OrderPatch, OrderResult, OrderStatus, ProductId,
};
