//! Order lifecycle orchestration.
//!
//! This crate coordinates the order store, the inventory reservation
//! collaborator and the event notifier into the four lifecycle operations:
//! 1. Create: tentative insert, reserve stock, then commit items or
//!    compensate by deleting the tentative order
//! 2. Read a live order with its items
//! 3. Field-level merge update
//! 4. Soft delete
//!
//! Every successful mutation is followed by a best-effort event.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod response;
pub mod services;

pub use config::{LifecycleConfig, StatusPolicy};
pub use coordinator::LifecycleCoordinator;
pub use error::LifecycleError;
pub use events::{OrderEvent, OrderEventPayload, OrderTopic};
pub use response::OperationResponse;
pub use services::{
    BroadcastNotifier, CustomerDirectory, EventNotifier, InMemoryCustomerDirectory,
    InMemoryInventoryService, InMemoryNotifier, InventoryService, OUT_OF_STOCK_PRODUCT, Reservation,
    run_event_listener,
};
