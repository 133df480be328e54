use async_trait::async_trait;
use domain::{CustomerId, LineItem, Order, OrderFields, OrderItem, OrderStatus, ProductId};

use crate::{OrderId, Result};

/// Which rows a read is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletedFilter {
    /// Only rows with `deleted = false`. Every normal read path uses this.
    #[default]
    LiveOnly,

    /// Tombstones too. Used to confirm a soft delete.
    IncludeDeleted,
}

impl DeletedFilter {
    /// Returns true if a row with the given tombstone flag passes the filter.
    pub fn admits(&self, deleted: bool) -> bool {
        match self {
            DeletedFilter::LiveOnly => !deleted,
            DeletedFilter::IncludeDeleted => true,
        }
    }
}

/// Columns supplied when an order row is first inserted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub status: OrderStatus,
}

impl NewOrder {
    /// A tentative order in `pending` status.
    pub fn pending(customer_id: Option<CustomerId>) -> Self {
        Self {
            customer_id,
            status: OrderStatus::Pending,
        }
    }
}

/// Columns supplied when an item row is inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl From<&LineItem> for NewOrderItem {
    fn from(line: &LineItem) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
        }
    }
}

/// Core trait for order store implementations.
///
/// Writes that belong to the create flow go through an [`OrderTransaction`]
/// so that a tentative order and its items (or its compensating delete)
/// become visible together or not at all. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Transaction handle returned by [`OrderStore::begin`].
    type Transaction: OrderTransaction;

    /// Opens a transaction. Dropping it without committing rolls it back.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Loads an order with all of its items.
    ///
    /// An order without items is returned with an empty `items` vector.
    /// Returns None if no row passes `filter`.
    async fn select_order_with_items(
        &self,
        order_id: OrderId,
        filter: DeletedFilter,
    ) -> Result<Option<Order>>;

    /// Overwrites the writable fields of a live order.
    ///
    /// Returns false if no live row matched.
    async fn update_order_fields(&self, order_id: OrderId, fields: &OrderFields) -> Result<bool>;

    /// Sets `deleted = true` on an order, leaving its items untouched.
    ///
    /// Returns false if no row matched.
    async fn mark_deleted(&self, order_id: OrderId) -> Result<bool>;

    /// Lists the items stored for an order, whatever its tombstone state.
    async fn list_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;
}

/// Writes of the create flow, applied atomically on [`OrderTransaction::commit`].
#[async_trait]
pub trait OrderTransaction: Send {
    /// Inserts a new order row and returns it as stored (with no items).
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;

    /// Inserts the items of an order, preserving their order.
    async fn insert_items(
        &mut self,
        order_id: OrderId,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>>;

    /// Hard-deletes an order row. Returns false if no row matched.
    async fn delete_order(&mut self, order_id: OrderId) -> Result<bool>;

    /// Makes every write of this transaction visible.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this transaction.
    async fn rollback(self) -> Result<()>;
}
