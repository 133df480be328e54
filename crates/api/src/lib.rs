//! HTTP API server with observability for the order lifecycle service.
//!
//! Exposes the create, read, update and soft-delete operations over REST,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use lifecycle::{BroadcastNotifier, InMemoryInventoryService, LifecycleConfig, LifecycleCoordinator};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::AuthConfig;
use routes::orders::AppState;

/// Events buffered per subscriber when no capacity is configured.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Creates the Axum application router with all routes and shared state.
///
/// Only the order routes sit behind the API key guard.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    auth: AuthConfig,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let order_routes = Router::new()
        .route("/order/{order_id}", get(routes::orders::get::<S>))
        .route("/order/create", post(routes::orders::create::<S>))
        .route("/order/update/{order_id}", put(routes::orders::update::<S>))
        .route("/order/delete/{order_id}", delete(routes::orders::delete::<S>))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(auth),
            routes::auth::require_api_key,
        ))
        .with_state(state);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(order_routes)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around an order store.
pub fn create_state<S: OrderStore + 'static>(
    store: S,
    config: LifecycleConfig,
    notifier: BroadcastNotifier,
) -> Arc<AppState<S>> {
    let coordinator =
        LifecycleCoordinator::new(store, InMemoryInventoryService::new(), notifier.clone())
            .with_config(config);

    Arc::new(AppState {
        coordinator,
        notifier,
    })
}

/// Creates the default application state with the in-memory inventory.
pub fn create_default_state<S: OrderStore + 'static>(store: S) -> Arc<AppState<S>> {
    create_state(
        store,
        LifecycleConfig::default(),
        BroadcastNotifier::new(DEFAULT_EVENT_BUFFER),
    )
}
