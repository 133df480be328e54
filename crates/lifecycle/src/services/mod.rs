//! External collaborator traits and in-memory implementations.

pub mod customer;
pub mod inventory;
pub mod notifier;

pub use customer::{CustomerDirectory, InMemoryCustomerDirectory};
pub use inventory::{InMemoryInventoryService, InventoryService, OUT_OF_STOCK_PRODUCT, Reservation};
pub use notifier::{BroadcastNotifier, EventNotifier, InMemoryNotifier, run_event_listener};
