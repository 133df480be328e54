//! Integration tests for the order lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use domain::{CreateOrderRequest, LineItem, Order, OrderFields, OrderItem, OrderPatch, OrderStatus};
use lifecycle::{
    InMemoryCustomerDirectory, InMemoryInventoryService, InMemoryNotifier, LifecycleConfig,
    LifecycleCoordinator, LifecycleError, OUT_OF_STOCK_PRODUCT, OrderTopic, StatusPolicy,
};
use order_store::{DeletedFilter, InMemoryOrderStore, OrderStore};

type TestCoordinator =
    LifecycleCoordinator<InMemoryOrderStore, InMemoryInventoryService, InMemoryNotifier>;

struct TestHarness {
    coordinator: TestCoordinator,
    store: InMemoryOrderStore,
    inventory: InMemoryInventoryService,
    notifier: InMemoryNotifier,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(LifecycleConfig::default())
    }

    fn with_config(config: LifecycleConfig) -> Self {
        let store = InMemoryOrderStore::new();
        let inventory = InMemoryInventoryService::new();
        let notifier = InMemoryNotifier::new();

        let coordinator =
            LifecycleCoordinator::new(store.clone(), inventory.clone(), notifier.clone())
                .with_config(config);

        Self {
            coordinator,
            store,
            inventory,
            notifier,
        }
    }

    /// Creates a committed order and clears the recorded events.
    async fn create_order(&self, items: Vec<LineItem>) -> OrderId {
        let response = self
            .coordinator
            .create_order(CreateOrderRequest::new("cus-123", items))
            .await;
        assert!(response.success, "order should have been created");
        self.notifier.clear();
        response.data.unwrap().order_id
    }

    async fn tombstone(&self, order_id: OrderId) -> Option<Order> {
        self.store
            .select_order_with_items(order_id, DeletedFilter::IncludeDeleted)
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_create_with_reserved_items() {
    let h = TestHarness::new();

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await;

    assert!(response.success);
    assert_eq!(response.message, "Order created");
    let result = response.data.unwrap();
    assert_eq!(result.status, OrderStatus::Pending);
    assert_eq!(result.items, vec![LineItem::new("abc123", 1)]);

    let events = h.notifier.published();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].topic, OrderTopic::OrderCreated);
    assert_eq!(events[0].order_id(), result.order_id);
    assert!(h.inventory.has_reservation(result.order_id));
}

#[tokio::test]
async fn test_create_with_out_of_stock_item_is_compensated() {
    let h = TestHarness::new();

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new(OUT_OF_STOCK_PRODUCT, 1)],
        ))
        .await;

    assert!(!response.success);
    assert_eq!(response.message, "Order not created");
    let result = response.data.unwrap();
    assert_eq!(result.status, OrderStatus::Canceled);
    assert_eq!(
        result.items,
        vec![LineItem::new(OUT_OF_STOCK_PRODUCT, 1).with_reservation(false)]
    );

    assert!(h.tombstone(result.order_id).await.is_none());
    assert!(h.store.list_items(result.order_id).await.unwrap().is_empty());
    assert_eq!(h.store.order_count().await, 0);
    assert!(h.notifier.published().is_empty());
}

#[tokio::test]
async fn test_partial_reservation_cancels_whole_order() {
    let h = TestHarness::new();

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![
                LineItem::new("abc123", 2),
                LineItem::new(OUT_OF_STOCK_PRODUCT, 1),
            ],
        ))
        .await;

    let result = response.data.unwrap();
    assert_eq!(result.status, OrderStatus::Canceled);
    assert_eq!(
        result
            .items
            .iter()
            .map(|i| i.reserved)
            .collect::<Vec<_>>(),
        vec![Some(true), Some(false)]
    );
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.item_count().await, 0);
    assert_eq!(h.inventory.reservation_count(), 0);
}

#[tokio::test]
async fn test_zero_quantity_items_are_not_persisted() {
    let h = TestHarness::new();

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![
                LineItem::new("abc123", 1),
                LineItem::new("def456", 0),
                LineItem::new("abc123", 3),
            ],
        ))
        .await;

    let result = response.data.unwrap();
    assert_eq!(result.status, OrderStatus::Pending);
    assert_eq!(
        result.items,
        vec![LineItem::new("abc123", 1), LineItem::new("abc123", 3)]
    );

    let persisted = h.store.list_items(result.order_id).await.unwrap();
    assert_eq!(persisted.len(), 2);
    assert!(persisted.iter().all(|i| i.quantity != 0));

    let order = h.coordinator.get_order(result.order_id).await.unwrap();
    let lines: Vec<LineItem> = order.items.iter().map(OrderItem::to_line).collect();
    assert_eq!(lines, result.items);
}

#[tokio::test]
async fn test_empty_item_list_creates_order_without_items() {
    let h = TestHarness::new();

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new("cus-123", vec![]))
        .await;

    assert!(response.success);
    let order_id = response.data.unwrap().order_id;
    assert_eq!(h.inventory.reserve_calls(), 1);

    let order = h.coordinator.get_order(order_id).await.unwrap();
    assert!(order.items.is_empty());
}

#[tokio::test]
async fn test_inventory_failure_rolls_back() {
    let h = TestHarness::new();
    h.inventory.set_fail_on_reserve(true);

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await;

    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.message, "Order not created");
    assert_eq!(h.store.order_count().await, 0);
    assert!(h.notifier.published().is_empty());
}

#[tokio::test]
async fn test_item_insert_failure_releases_reservation() {
    let h = TestHarness::new();
    h.store.set_fail_item_inserts(true).await;

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await;

    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(h.inventory.reserve_calls(), 1);
    assert_eq!(h.inventory.reservation_count(), 0);
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn test_store_outage_fails_create() {
    let h = TestHarness::new();
    h.store.set_fail_writes(true).await;

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await;

    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(h.inventory.reserve_calls(), 0);
}

#[tokio::test]
async fn test_notifier_failure_does_not_fail_create() {
    let h = TestHarness::new();
    h.notifier.set_fail_on_publish(true);

    let response = h
        .coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await;

    assert!(response.success);
    let order_id = response.data.unwrap().order_id;
    assert!(h.coordinator.get_order(order_id).await.is_ok());
}

#[tokio::test]
async fn test_update_merges_present_fields() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;
    let before = h.coordinator.get_order(order_id).await.unwrap();

    let response = h
        .coordinator
        .update_order(
            order_id,
            OrderPatch::new()
                .status("shipped")
                .tracking_company("Aus Post"),
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.message, "Order updated");
    let updated = response.data.unwrap();
    assert_eq!(updated.status, OrderStatus::Shipped);
    assert_eq!(updated.tracking_company.as_deref(), Some("Aus Post"));
    assert_eq!(updated.tracking_number, None);
    assert_eq!(updated.customer_id, before.customer_id);
    assert_eq!(updated.items, before.items);
    assert_eq!(updated.created_at, before.created_at);

    assert_eq!(h.notifier.topics(), vec![OrderTopic::OrderUpdated]);
}

#[tokio::test]
async fn test_empty_patch_changes_nothing() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;
    let before = h.coordinator.get_order(order_id).await.unwrap();

    let response = h
        .coordinator
        .update_order(order_id, OrderPatch::new())
        .await
        .unwrap();

    assert_eq!(response.data.unwrap(), before);
}

#[tokio::test]
async fn test_customer_change_publishes_customer_updated() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;

    let response = h
        .coordinator
        .update_order(order_id, OrderPatch::new().customer_id("cus-456"))
        .await
        .unwrap();

    assert_eq!(
        response.data.unwrap().customer_id.unwrap().as_str(),
        "cus-456"
    );
    assert_eq!(
        h.notifier.topics(),
        vec![OrderTopic::OrderUpdated, OrderTopic::CustomerUpdated]
    );
}

#[tokio::test]
async fn test_invalid_status_is_rejected() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;
    let before = h.coordinator.get_order(order_id).await.unwrap();

    for value in ["bogus", "archived"] {
        let result = h
            .coordinator
            .update_order(
                order_id,
                OrderPatch::new().status(value).tracking_company("Aus Post"),
            )
            .await;
        assert!(matches!(result, Err(LifecycleError::InvalidStatus(ref v)) if v == value));
    }

    assert_eq!(h.coordinator.get_order(order_id).await.unwrap(), before);
    assert!(h.notifier.published().is_empty());
}

#[tokio::test]
async fn test_permissive_policy_allows_any_transition() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;

    for status in ["completed", "pending", "canceled", "shipped"] {
        let response = h
            .coordinator
            .update_order(order_id, OrderPatch::new().status(status))
            .await
            .unwrap();
        assert!(response.success);
    }
}

#[tokio::test]
async fn test_strict_policy_rejects_illegal_transition() {
    let h =
        TestHarness::with_config(LifecycleConfig::default().with_status_policy(StatusPolicy::Strict));
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;

    let result = h
        .coordinator
        .update_order(order_id, OrderPatch::new().status("completed"))
        .await;
    assert!(matches!(
        result,
        Err(LifecycleError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Completed
        })
    ));

    let shipped = h
        .coordinator
        .update_order(order_id, OrderPatch::new().status("shipped"))
        .await
        .unwrap();
    assert!(shipped.success);

    let same = h
        .coordinator
        .update_order(order_id, OrderPatch::new().tracking_number("TRK-1"))
        .await
        .unwrap();
    assert!(same.success);
}

#[tokio::test]
async fn test_update_missing_order() {
    let h = TestHarness::new();
    let order_id = OrderId::new();

    let result = h
        .coordinator
        .update_order(order_id, OrderPatch::new().status("shipped"))
        .await;

    assert!(matches!(result, Err(LifecycleError::NotFound(id)) if id == order_id));
    assert!(h.notifier.published().is_empty());
}

#[tokio::test]
async fn test_update_write_failure_is_structured() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;
    h.store.set_fail_writes(true).await;

    let response = h
        .coordinator
        .update_order(order_id, OrderPatch::new().status("shipped"))
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.message, "Order not updated");
    assert!(h.notifier.published().is_empty());
}

#[tokio::test]
async fn test_soft_delete_leaves_tombstone() {
    let h = TestHarness::new();
    let order_id = h
        .create_order(vec![LineItem::new("abc123", 1), LineItem::new("def456", 2)])
        .await;
    let items_before = h.store.list_items(order_id).await.unwrap();

    let response = h.coordinator.soft_delete_order(order_id).await.unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Order marked for deletion");
    assert!(response.data.is_none());

    assert!(matches!(
        h.coordinator.get_order(order_id).await,
        Err(LifecycleError::NotFound(_))
    ));

    let tombstone = h.tombstone(order_id).await.unwrap();
    assert!(tombstone.deleted);
    assert_eq!(tombstone.items, items_before);
    assert_eq!(h.notifier.topics(), vec![OrderTopic::OrderDeleted]);
}

#[tokio::test]
async fn test_tombstone_cannot_be_updated_or_deleted_again() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;
    h.coordinator.soft_delete_order(order_id).await.unwrap();

    assert!(matches!(
        h.coordinator
            .update_order(order_id, OrderPatch::new().status("shipped"))
            .await,
        Err(LifecycleError::NotFound(_))
    ));
    assert!(matches!(
        h.coordinator.soft_delete_order(order_id).await,
        Err(LifecycleError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_soft_delete_write_failure_is_structured() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;
    h.store.set_fail_writes(true).await;

    let response = h.coordinator.soft_delete_order(order_id).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.message, "Order not deleted");
    assert!(h.coordinator.get_order(order_id).await.is_ok());
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let h = TestHarness::new();

    let result = h.coordinator.get_order(OrderId::new()).await;
    assert!(matches!(result, Err(LifecycleError::NotFound(_))));
    assert_eq!(h.store.order_count().await, 0);
    assert!(h.notifier.published().is_empty());
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let h = TestHarness::new();
    let order_id = h.create_order(vec![LineItem::new("abc123", 1)]).await;

    let first = h.coordinator.get_order(order_id).await.unwrap();
    let second = h.coordinator.get_order(order_id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_customer_validation() {
    let directory = Arc::new(InMemoryCustomerDirectory::with_customers(["cus-123"]));
    let store = InMemoryOrderStore::new();
    let notifier = InMemoryNotifier::new();
    let coordinator = LifecycleCoordinator::new(
        store.clone(),
        InMemoryInventoryService::new(),
        notifier.clone(),
    )
    .with_customer_directory(directory.clone());

    let rejected = coordinator
        .create_order(CreateOrderRequest::new(
            "cus-999",
            vec![LineItem::new("abc123", 1)],
        ))
        .await;
    assert!(!rejected.success);
    assert_eq!(store.order_count().await, 0);

    let created = coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await;
    let order_id = created.data.unwrap().order_id;

    let result = coordinator
        .update_order(order_id, OrderPatch::new().customer_id("cus-999"))
        .await;
    assert!(matches!(result, Err(LifecycleError::UnknownCustomer(ref c)) if c.as_str() == "cus-999"));

    directory.register("cus-999");
    let response = coordinator
        .update_order(order_id, OrderPatch::new().customer_id("cus-999"))
        .await
        .unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn test_customer_directory_outage() {
    let directory = Arc::new(InMemoryCustomerDirectory::with_customers(["cus-123"]));
    let store = InMemoryOrderStore::new();
    let inventory = InMemoryInventoryService::new();
    let coordinator =
        LifecycleCoordinator::new(store.clone(), inventory.clone(), InMemoryNotifier::new())
            .with_customer_directory(directory.clone());

    let order_id = coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await
        .data
        .unwrap()
        .order_id;

    directory.set_fail_on_lookup(true);

    let rejected = coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await;
    assert!(!rejected.success);
    assert!(rejected.data.is_none());
    assert_eq!(rejected.message, "Order not created");
    assert_eq!(store.order_count().await, 1);
    assert_eq!(inventory.reserve_calls(), 1);

    let result = coordinator
        .update_order(order_id, OrderPatch::new().customer_id("cus-456"))
        .await;
    assert!(matches!(result, Err(LifecycleError::CustomerService(_))));

    let unchanged = coordinator.get_order(order_id).await.unwrap();
    assert_eq!(unchanged.customer_id.unwrap().as_str(), "cus-123");
}

/// Store whose orders disappear from live reads after the first update.
#[derive(Clone)]
struct VanishingStore {
    inner: InMemoryOrderStore,
    vanished: Arc<AtomicBool>,
}

#[async_trait]
impl OrderStore for VanishingStore {
    type Transaction = <InMemoryOrderStore as OrderStore>::Transaction;

    async fn begin(&self) -> order_store::Result<Self::Transaction> {
        self.inner.begin().await
    }

    async fn select_order_with_items(
        &self,
        order_id: OrderId,
        filter: DeletedFilter,
    ) -> order_store::Result<Option<Order>> {
        if self.vanished.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.select_order_with_items(order_id, filter).await
    }

    async fn update_order_fields(
        &self,
        order_id: OrderId,
        fields: &OrderFields,
    ) -> order_store::Result<bool> {
        let updated = self.inner.update_order_fields(order_id, fields).await?;
        self.vanished.store(true, Ordering::SeqCst);
        Ok(updated)
    }

    async fn mark_deleted(&self, order_id: OrderId) -> order_store::Result<bool> {
        let marked = self.inner.mark_deleted(order_id).await?;
        self.vanished.store(true, Ordering::SeqCst);
        Ok(marked)
    }

    async fn list_items(&self, order_id: OrderId) -> order_store::Result<Vec<OrderItem>> {
        self.inner.list_items(order_id).await
    }
}

#[tokio::test]
async fn test_missing_read_back_after_write_is_a_failure() {
    let store = VanishingStore {
        inner: InMemoryOrderStore::new(),
        vanished: Arc::new(AtomicBool::new(false)),
    };
    let notifier = InMemoryNotifier::new();
    let coordinator =
        LifecycleCoordinator::new(store.clone(), InMemoryInventoryService::new(), notifier.clone());

    let order_id = coordinator
        .create_order(CreateOrderRequest::new(
            "cus-123",
            vec![LineItem::new("abc123", 1)],
        ))
        .await
        .data
        .unwrap()
        .order_id;
    notifier.clear();

    let updated = coordinator
        .update_order(order_id, OrderPatch::new().status("shipped"))
        .await
        .unwrap();
    assert!(!updated.success);
    assert_eq!(updated.message, "Order not updated");

    store.vanished.store(false, Ordering::SeqCst);
    let deleted = coordinator.soft_delete_order(order_id).await.unwrap();
    assert!(!deleted.success);
    assert_eq!(deleted.message, "Order not deleted");

    assert!(notifier.published().is_empty());
}
