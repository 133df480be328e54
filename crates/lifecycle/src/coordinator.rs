//! Lifecycle coordinator for orchestrating order mutations.

use std::sync::Arc;

use common::OrderId;
use domain::{CreateOrderRequest, CustomerId, Order, OrderItem, OrderPatch, OrderResult};
use order_store::{DeletedFilter, NewOrder, NewOrderItem, OrderStore, OrderTransaction, StoreError};

use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, Result};
use crate::events::{OrderEvent, OrderTopic};
use crate::response::OperationResponse;
use crate::services::customer::CustomerDirectory;
use crate::services::inventory::InventoryService;
use crate::services::notifier::EventNotifier;

const ORDER_CREATED: &str = "Order created";
const ORDER_NOT_CREATED: &str = "Order not created";
const ORDER_UPDATED: &str = "Order updated";
const ORDER_NOT_UPDATED: &str = "Order not updated";
const ORDER_DELETED: &str = "Order marked for deletion";
const ORDER_NOT_DELETED: &str = "Order not deleted";

/// Orchestrates the order lifecycle.
///
/// Creation inserts a tentative order, reserves stock for it and then either
/// commits the items or deletes the tentative order again, all inside one
/// store transaction. Successful mutations are announced through the
/// notifier on a best-effort basis.
pub struct LifecycleCoordinator<S, I, N>
where
    S: OrderStore,
    I: InventoryService,
    N: EventNotifier,
{
    store: S,
    inventory: I,
    notifier: N,
    customers: Option<Arc<dyn CustomerDirectory>>,
    config: LifecycleConfig,
}

impl<S, I, N> LifecycleCoordinator<S, I, N>
where
    S: OrderStore,
    I: InventoryService,
    N: EventNotifier,
{
    /// Creates a coordinator with the default configuration and no
    /// customer validation.
    pub fn new(store: S, inventory: I, notifier: N) -> Self {
        Self {
            store,
            inventory,
            notifier,
            customers: None,
            config: LifecycleConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables customer validation on create and update.
    pub fn with_customer_directory(mut self, customers: Arc<dyn CustomerDirectory>) -> Self {
        self.customers = Some(customers);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Creates an order if stock can be reserved for every item.
    ///
    /// A reservation failure is a normal outcome: the answer carries the
    /// canceled order with the per-item reservation flags. Internal errors
    /// are logged and answered with a generic failure.
    #[tracing::instrument(
        skip(self, request),
        fields(customer_id = ?request.customer_id, item_count = request.items.len())
    )]
    pub async fn create_order(&self, request: CreateOrderRequest) -> OperationResponse<OrderResult> {
        let start = std::time::Instant::now();
        let outcome = self.try_create(request).await;
        metrics::histogram!("order_create_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match outcome {
            Ok(result) if result.is_pending() => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(order_id = %result.order_id, "order created");
                self.notify(OrderTopic::OrderCreated, result.order_id).await;
                OperationResponse::success(Some(result), ORDER_CREATED)
            }
            Ok(result) => {
                metrics::counter!("orders_canceled_total").increment(1);
                let unreserved: Vec<&str> = result
                    .items
                    .iter()
                    .filter(|item| !item.is_reserved())
                    .map(|item| item.product_id.as_str())
                    .collect();
                tracing::warn!(
                    order_id = %result.order_id,
                    ?unreserved,
                    "order canceled, stock could not be reserved"
                );
                OperationResponse::failure(Some(result), ORDER_NOT_CREATED)
            }
            Err(LifecycleError::UnknownCustomer(customer_id)) => {
                metrics::counter!("orders_create_failed_total").increment(1);
                tracing::warn!(%customer_id, "order rejected for unknown customer");
                OperationResponse::failure(None, ORDER_NOT_CREATED)
            }
            Err(e) => {
                metrics::counter!("orders_create_failed_total").increment(1);
                tracing::error!(error = %e, "order creation failed");
                OperationResponse::failure(None, ORDER_NOT_CREATED)
            }
        }
    }

    async fn try_create(&self, request: CreateOrderRequest) -> Result<OrderResult> {
        if let Some(customer_id) = &request.customer_id {
            self.ensure_customer_known(customer_id).await?;
        }

        let mut tx = self.store.begin().await?;
        let order = tx
            .insert_order(NewOrder::pending(request.customer_id.clone()))
            .await?;
        let order_id = order.order_id;

        let Some(customer_id) = order.customer_id else {
            abandon(tx, order_id).await;
            return Err(StoreError::InvalidRow(format!(
                "order {order_id} was stored without a customer"
            ))
            .into());
        };

        let reservation = match self.inventory.reserve(order_id, request.items.clone()).await {
            Ok(reservation) => reservation,
            Err(e) => {
                abandon(tx, order_id).await;
                return Err(e);
            }
        };

        if !reservation.reserved {
            // Compensate inside the same transaction so the tentative order
            // never becomes visible.
            tx.delete_order(order_id).await?;
            tx.commit().await?;
            return Ok(OrderResult::canceled(
                order_id,
                Some(customer_id),
                reservation.items,
            ));
        }

        // Zero-quantity lines are reserved along with the rest but never stored.
        let new_items: Vec<NewOrderItem> = request
            .items
            .iter()
            .filter(|item| item.quantity != 0)
            .map(NewOrderItem::from)
            .collect();
        let inserted = match tx.insert_items(order_id, new_items).await {
            Ok(inserted) => inserted,
            Err(e) => {
                abandon(tx, order_id).await;
                self.release_reservation(order_id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = tx.commit().await {
            self.release_reservation(order_id).await;
            return Err(e.into());
        }

        let items = inserted.iter().map(OrderItem::to_line).collect();

        Ok(OrderResult::pending(order_id, Some(customer_id), items))
    }

    /// Returns a live order with its items.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.load_live(order_id).await
    }

    /// Merges a patch into a live order.
    ///
    /// Not-found and validation failures are errors; a failed write is
    /// answered with an unsuccessful response.
    #[tracing::instrument(skip(self, patch), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: OrderId,
        patch: OrderPatch,
    ) -> Result<OperationResponse<Order>> {
        let current = match self.load_live(order_id).await {
            Ok(order) => order,
            Err(LifecycleError::Persistence(_)) => {
                return Ok(OperationResponse::failure(None, ORDER_NOT_UPDATED));
            }
            Err(e) => return Err(e),
        };

        let merged = patch.apply_to(current.fields())?;
        self.config
            .status_policy
            .check(current.status, merged.status)?;

        let customer_changed = merged.customer_id != current.customer_id;
        if customer_changed && let Some(customer_id) = &merged.customer_id {
            self.ensure_customer_known(customer_id).await?;
        }

        match self.store.update_order_fields(order_id, &merged).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("order disappeared before the update was written");
                return Ok(OperationResponse::failure(None, ORDER_NOT_UPDATED));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to write order update");
                return Ok(OperationResponse::failure(None, ORDER_NOT_UPDATED));
            }
        }

        let updated = match self
            .store
            .select_order_with_items(order_id, DeletedFilter::LiveOnly)
            .await
        {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::error!("updated order could not be read back");
                return Ok(OperationResponse::failure(None, ORDER_NOT_UPDATED));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read back updated order");
                return Ok(OperationResponse::failure(None, ORDER_NOT_UPDATED));
            }
        };

        metrics::counter!("orders_updated_total").increment(1);
        tracing::info!(status = %updated.status, "order updated");

        self.notify(OrderTopic::OrderUpdated, order_id).await;
        if customer_changed {
            self.notify(OrderTopic::CustomerUpdated, order_id).await;
        }

        Ok(OperationResponse::success(Some(updated), ORDER_UPDATED))
    }

    /// Marks a live order as deleted. Its items are left in place.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn soft_delete_order(&self, order_id: OrderId) -> Result<OperationResponse<()>> {
        match self.load_live(order_id).await {
            Ok(_) => {}
            Err(LifecycleError::Persistence(_)) => {
                return Ok(OperationResponse::failure(None, ORDER_NOT_DELETED));
            }
            Err(e) => return Err(e),
        }

        match self.store.mark_deleted(order_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("order disappeared before it could be marked deleted");
                return Ok(OperationResponse::failure(None, ORDER_NOT_DELETED));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to mark order deleted");
                return Ok(OperationResponse::failure(None, ORDER_NOT_DELETED));
            }
        }

        match self
            .store
            .select_order_with_items(order_id, DeletedFilter::IncludeDeleted)
            .await
        {
            Ok(Some(order)) if order.deleted => {}
            Ok(_) => {
                tracing::error!("soft delete could not be confirmed");
                return Ok(OperationResponse::failure(None, ORDER_NOT_DELETED));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to confirm soft delete");
                return Ok(OperationResponse::failure(None, ORDER_NOT_DELETED));
            }
        }

        metrics::counter!("orders_deleted_total").increment(1);
        tracing::info!("order marked for deletion");
        self.notify(OrderTopic::OrderDeleted, order_id).await;

        Ok(OperationResponse::success(None, ORDER_DELETED))
    }

    async fn load_live(&self, order_id: OrderId) -> Result<Order> {
        match self
            .store
            .select_order_with_items(order_id, DeletedFilter::LiveOnly)
            .await
        {
            Ok(Some(order)) => Ok(order),
            Ok(None) => Err(LifecycleError::NotFound(order_id)),
            Err(e) => {
                tracing::error!(%order_id, error = %e, "failed to load order");
                Err(e.into())
            }
        }
    }

    async fn ensure_customer_known(&self, customer_id: &CustomerId) -> Result<()> {
        let Some(customers) = &self.customers else {
            return Ok(());
        };
        if customers.customer_exists(customer_id).await? {
            Ok(())
        } else {
            Err(LifecycleError::UnknownCustomer(customer_id.clone()))
        }
    }

    async fn release_reservation(&self, order_id: OrderId) {
        if let Err(e) = self.inventory.release(order_id).await {
            tracing::error!(%order_id, error = %e, "failed to release reservation");
        }
    }

    async fn notify(&self, topic: OrderTopic, order_id: OrderId) {
        match self.notifier.publish(OrderEvent::new(topic, order_id)).await {
            Ok(()) => {
                metrics::counter!("order_events_published_total", "topic" => topic.as_str())
                    .increment(1);
            }
            Err(e) => {
                metrics::counter!("order_events_dropped_total").increment(1);
                tracing::warn!(%topic, %order_id, error = %e, "event not published");
            }
        }
    }
}

/// Rolls back a create transaction that cannot be completed.
async fn abandon<T: OrderTransaction>(tx: T, order_id: OrderId) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(%order_id, error = %e, "rollback failed");
    }
}
