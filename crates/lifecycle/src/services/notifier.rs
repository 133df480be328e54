//! Event notifier trait and implementations.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::LifecycleError;
use crate::events::{OrderEvent, OrderTopic};

/// Publishes lifecycle events.
///
/// Callers treat publication as best effort: an error is logged and counted
/// but never changes the outcome of the operation that produced the event.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn publish(&self, event: OrderEvent) -> Result<(), LifecycleError>;
}

/// Notifier backed by a tokio broadcast channel.
///
/// Subscribers that fall behind lose the oldest events.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<OrderEvent>,
}

impl BroadcastNotifier {
    /// Creates a notifier buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventNotifier for BroadcastNotifier {
    async fn publish(&self, event: OrderEvent) -> Result<(), LifecycleError> {
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|e| LifecycleError::Notifier(format!("no subscribers for {}", e.0.topic)))
    }
}

/// Consumes a broadcast subscription, logging every event it sees.
///
/// Returns once every sender has been dropped.
pub async fn run_event_listener(mut receiver: broadcast::Receiver<OrderEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                tracing::info!(
                    topic = %event.topic,
                    order_id = %event.order_id(),
                    occurred_at = %event.occurred_at,
                    "order event"
                );
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                metrics::counter!("order_events_dropped_total").increment(skipped);
                tracing::warn!(skipped, "event listener lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::info!("event listener stopped");
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    published: Vec<OrderEvent>,
    fail_on_publish: bool,
}

/// Notifier that records events for inspection in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future publish fail. Failed events are not recorded.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_publish = fail;
    }

    /// Returns every event accepted so far, oldest first.
    pub fn published(&self) -> Vec<OrderEvent> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .published
            .clone()
    }

    /// Returns the topics of every accepted event, oldest first.
    pub fn topics(&self) -> Vec<OrderTopic> {
        self.published().iter().map(|e| e.topic).collect()
    }

    pub fn clear(&self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .published
            .clear();
    }
}

#[async_trait]
impl EventNotifier for InMemoryNotifier {
    async fn publish(&self, event: OrderEvent) -> Result<(), LifecycleError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_publish {
            return Err(LifecycleError::Notifier("notifier unavailable".to_string()));
        }
        state.published.push(event);
        Ok(())
    }
}
