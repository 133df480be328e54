use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domain::{Order, OrderFields, OrderItem};
use tokio::sync::RwLock;

use crate::{
    OrderId, OrderItemId, Result, StoreError,
    store::{DeletedFilter, NewOrder, NewOrderItem, OrderStore, OrderTransaction},
};

#[derive(Debug, Default)]
struct Tables {
    /// Order rows, stored without their items.
    orders: HashMap<OrderId, Order>,
    /// Item rows in insertion order.
    items: Vec<OrderItem>,
    fail_writes: bool,
    fail_reads: bool,
    fail_item_inserts: bool,
}

impl Tables {
    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes are disabled".to_string()));
        }
        Ok(())
    }

    fn check_readable(&self) -> Result<()> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("reads are disabled".to_string()));
        }
        Ok(())
    }

    fn items_for(&self, order_id: OrderId) -> Vec<OrderItem> {
        self.items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect()
    }
}

/// In-memory order store implementation for testing.
///
/// This implementation keeps all rows in memory and provides the same
/// interface and visibility rules as the PostgreSQL implementation:
/// transactional writes stay invisible until commit, and an order with
/// items cannot be hard-deleted.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with [`StoreError::Unavailable`].
    pub async fn set_fail_writes(&self, fail: bool) {
        self.tables.write().await.fail_writes = fail;
    }

    /// Makes every subsequent read fail with [`StoreError::Unavailable`].
    pub async fn set_fail_reads(&self, fail: bool) {
        self.tables.write().await.fail_reads = fail;
    }

    /// Makes every subsequent item insert fail with [`StoreError::Unavailable`].
    pub async fn set_fail_item_inserts(&self, fail: bool) {
        self.tables.write().await.fail_item_inserts = fail;
    }

    /// Returns the number of order rows, tombstones included.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of item rows.
    pub async fn item_count(&self) -> usize {
        self.tables.read().await.items.len()
    }

    /// Clears all rows.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.orders.clear();
        tables.items.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        Ok(InMemoryTransaction {
            tables: self.tables.clone(),
            staged_orders: Vec::new(),
            staged_items: Vec::new(),
            staged_deletes: Vec::new(),
        })
    }

    async fn select_order_with_items(
        &self,
        order_id: OrderId,
        filter: DeletedFilter,
    ) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        tables.check_readable()?;
        let Some(order) = tables.orders.get(&order_id) else {
            return Ok(None);
        };
        if !filter.admits(order.deleted) {
            return Ok(None);
        }

        let mut order = order.clone();
        order.items = tables.items_for(order_id);
        Ok(Some(order))
    }

    async fn update_order_fields(&self, order_id: OrderId, fields: &OrderFields) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;

        match tables.orders.get_mut(&order_id) {
            Some(order) if !order.deleted => {
                order.customer_id = fields.customer_id.clone();
                order.status = fields.status;
                order.tracking_company = fields.tracking_company.clone();
                order.tracking_number = fields.tracking_number.clone();
                order.tracking_link = fields.tracking_link.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_deleted(&self, order_id: OrderId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;

        match tables.orders.get_mut(&order_id) {
            Some(order) => {
                order.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        tables.check_readable()?;
        Ok(tables.items_for(order_id))
    }
}

/// Transaction over an [`InMemoryOrderStore`].
///
/// Writes are staged locally and applied under a single write lock on commit.
pub struct InMemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    staged_orders: Vec<Order>,
    staged_items: Vec<OrderItem>,
    staged_deletes: Vec<OrderId>,
}

impl InMemoryTransaction {
    fn staged_order_exists(&self, order_id: OrderId) -> bool {
        self.staged_orders.iter().any(|o| o.order_id == order_id)
    }
}

#[async_trait]
impl OrderTransaction for InMemoryTransaction {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        self.tables.read().await.check_writable()?;

        let row = Order {
            order_id: OrderId::new(),
            customer_id: order.customer_id,
            status: order.status,
            tracking_company: None,
            tracking_number: None,
            tracking_link: None,
            deleted: false,
            created_at: Utc::now(),
            items: Vec::new(),
        };
        self.staged_orders.push(row.clone());
        Ok(row)
    }

    async fn insert_items(
        &mut self,
        order_id: OrderId,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>> {
        {
            let tables = self.tables.read().await;
            tables.check_writable()?;
            if tables.fail_item_inserts {
                return Err(StoreError::Unavailable(
                    "item inserts are disabled".to_string(),
                ));
            }

            let committed = tables.orders.contains_key(&order_id)
                && !self.staged_deletes.contains(&order_id);
            if !committed && !self.staged_order_exists(order_id) {
                return Err(StoreError::OrderNotFound(order_id));
            }
        }

        let rows: Vec<OrderItem> = items
            .into_iter()
            .map(|item| OrderItem {
                item_id: OrderItemId::new(),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();
        self.staged_items.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn delete_order(&mut self, order_id: OrderId) -> Result<bool> {
        let tables = self.tables.read().await;
        tables.check_writable()?;

        // Foreign key simulation: items pin their order.
        let has_items = self.staged_items.iter().any(|i| i.order_id == order_id)
            || tables.items.iter().any(|i| i.order_id == order_id);
        if has_items {
            return Err(StoreError::InvalidRow(format!(
                "order {order_id} is still referenced by items"
            )));
        }

        if self.staged_order_exists(order_id) {
            self.staged_orders.retain(|o| o.order_id != order_id);
            return Ok(true);
        }

        if tables.orders.contains_key(&order_id) && !self.staged_deletes.contains(&order_id) {
            self.staged_deletes.push(order_id);
            return Ok(true);
        }

        Ok(false)
    }

    async fn commit(self) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;

        for order_id in &self.staged_deletes {
            tables.orders.remove(order_id);
        }
        for order in self.staged_orders {
            tables.orders.insert(order.order_id, order);
        }
        tables.items.extend(self.staged_items);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
