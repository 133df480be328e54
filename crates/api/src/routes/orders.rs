//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{CreateOrderRequest, Order, OrderPatch, OrderResult};
use lifecycle::{
    BroadcastNotifier, InMemoryInventoryService, LifecycleCoordinator, LifecycleError,
    OperationResponse,
};
use order_store::OrderStore;

use crate::error::ApiError;

/// Coordinator wired with the collaborators the server runs with.
pub type OrderCoordinator<S> =
    LifecycleCoordinator<S, InMemoryInventoryService, BroadcastNotifier>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub coordinator: OrderCoordinator<S>,
    pub notifier: BroadcastNotifier,
}

/// GET /order/{orderId}: load a live order with its items.
///
/// Store failures answer 404 like a missing order.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    match state.coordinator.get_order(order_id).await {
        Ok(order) => Ok(Json(order)),
        // Already logged with the order id by the coordinator.
        Err(LifecycleError::Persistence(_)) => Err(ApiError::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// POST /order/create: reserve stock and create an order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> (StatusCode, Json<OperationResponse<OrderResult>>) {
    let response = state.coordinator.create_order(req).await;
    let status = if response.is_success() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}

/// PUT /order/update/{orderId}: merge a patch into a live order.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
    Json(patch): Json<OrderPatch>,
) -> Result<(StatusCode, Json<OperationResponse<Order>>), ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let response = state.coordinator.update_order(order_id, patch).await?;
    Ok((status_for(&response), Json(response)))
}

/// DELETE /order/delete/{orderId}: mark a live order as deleted.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<(StatusCode, Json<OperationResponse<()>>), ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let response = state.coordinator.soft_delete_order(order_id).await?;
    Ok((status_for(&response), Json(response)))
}

fn status_for<T>(response: &OperationResponse<T>) -> StatusCode {
    if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// An identifier that is not a UUID cannot name a stored order.
fn parse_order_id(s: &str) -> Result<OrderId, ApiError> {
    s.parse().map_err(|_| ApiError::NotFound)
}
