//! API server entry point.

use api::config::Config;
use api::routes::orders::AppState;
use lifecycle::{BroadcastNotifier, run_event_listener};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    config: &Config,
    metrics_handle: PrometheusHandle,
) {
    let app = api::create_app(state, config.auth(), metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if config.api_key.is_none() {
        tracing::warn!("API_KEY is not set, order routes are unauthenticated");
    }

    // 3. Start the event listener before anything can publish
    let notifier = BroadcastNotifier::new(config.event_buffer);
    let listener = tokio::spawn(run_event_listener(notifier.subscribe()));

    // 4. Pick the order store and serve
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresOrderStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL order store");

            let state = api::create_state(store, config.lifecycle(), notifier);
            serve(state, &config, metrics_handle).await;
        }
        None => {
            tracing::info!("DATABASE_URL is not set, using in-memory order store");
            let state = api::create_state(InMemoryOrderStore::new(), config.lifecycle(), notifier);
            serve(state, &config, metrics_handle).await;
        }
    }

    // The state owned the last sender, so the listener drains and exits.
    if let Err(e) = listener.await {
        tracing::warn!(error = %e, "event listener task failed");
    }

    tracing::info!("server shut down gracefully");
}
