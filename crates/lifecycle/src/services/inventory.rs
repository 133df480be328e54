//! Inventory service trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{LineItem, ProductId};

use crate::error::LifecycleError;

/// Product that the in-memory inventory never has in stock.
pub const OUT_OF_STOCK_PRODUCT: &str = "outOfStock";

/// Answer of the inventory service for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub order_id: OrderId,
    /// The requested lines, each carrying its own outcome.
    pub items: Vec<LineItem>,
    /// True only if every line was reserved.
    pub reserved: bool,
}

impl Reservation {
    /// Builds a reservation whose aggregate outcome is the AND of its lines.
    pub fn from_items(order_id: OrderId, items: Vec<LineItem>) -> Self {
        let reserved = items.iter().all(LineItem::is_reserved);
        Self {
            order_id,
            items,
            reserved,
        }
    }

    /// Lines that could not be reserved.
    pub fn unreserved_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| !item.is_reserved())
    }
}

/// Trait for stock reservation.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Tries to reserve stock for every line of an order.
    ///
    /// A partial reservation is not an error: it is reported through
    /// [`Reservation::reserved`].
    async fn reserve(
        &self,
        order_id: OrderId,
        items: Vec<LineItem>,
    ) -> Result<Reservation, LifecycleError>;

    /// Releases whatever was reserved for an order.
    async fn release(&self, order_id: OrderId) -> Result<(), LifecycleError>;
}

#[derive(Debug)]
struct InMemoryInventoryState {
    out_of_stock: HashSet<ProductId>,
    reservations: HashMap<OrderId, Vec<LineItem>>,
    reserve_calls: usize,
    fail_on_reserve: bool,
}

impl Default for InMemoryInventoryState {
    fn default() -> Self {
        Self {
            out_of_stock: HashSet::from([ProductId::new(OUT_OF_STOCK_PRODUCT)]),
            reservations: HashMap::new(),
            reserve_calls: 0,
            fail_on_reserve: false,
        }
    }
}

/// In-memory inventory service.
///
/// Every product is in stock except [`OUT_OF_STOCK_PRODUCT`] and any product
/// registered with [`InMemoryInventoryService::mark_out_of_stock`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryService {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryService {
    /// Creates a new in-memory inventory service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future reservation of `product_id` fail.
    pub fn mark_out_of_stock(&self, product_id: impl Into<ProductId>) {
        self.write().out_of_stock.insert(product_id.into());
    }

    /// Configures the service to fail on reserve calls.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.write().fail_on_reserve = fail;
    }

    /// Returns the number of active reservations.
    pub fn reservation_count(&self) -> usize {
        self.read().reservations.len()
    }

    /// Returns true if stock is held for the order.
    pub fn has_reservation(&self, order_id: OrderId) -> bool {
        self.read().reservations.contains_key(&order_id)
    }

    /// Returns how many times `reserve` was called.
    pub fn reserve_calls(&self) -> usize {
        self.read().reserve_calls
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryInventoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryInventoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    async fn reserve(
        &self,
        order_id: OrderId,
        items: Vec<LineItem>,
    ) -> Result<Reservation, LifecycleError> {
        let mut state = self.write();
        state.reserve_calls += 1;

        if state.fail_on_reserve {
            return Err(LifecycleError::Inventory(
                "inventory service unavailable".to_string(),
            ));
        }

        let items: Vec<LineItem> = items
            .iter()
            .map(|item| item.with_reservation(!state.out_of_stock.contains(&item.product_id)))
            .collect();
        let reservation = Reservation::from_items(order_id, items);

        // Nothing is held unless the whole order can be fulfilled.
        if reservation.reserved {
            state
                .reservations
                .insert(order_id, reservation.items.clone());
        }

        Ok(reservation)
    }

    async fn release(&self, order_id: OrderId) -> Result<(), LifecycleError> {
        self.write().reservations.remove(&order_id);
        Ok(())
    }
}
