//! Persistence for orders and order items.
//!
//! The [`OrderStore`] trait is what the lifecycle needs from a relational
//! store. Two implementations are provided: [`PostgresOrderStore`] backed by
//! sqlx, and [`InMemoryOrderStore`] for tests and local runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{OrderId, OrderItemId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, InMemoryTransaction};
pub use postgres::{PgOrderTransaction, PostgresOrderStore};
pub use store::{DeletedFilter, NewOrder, NewOrderItem, OrderStore, OrderTransaction};
