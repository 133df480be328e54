//! Optional customer validation collaborator.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use domain::CustomerId;

use crate::error::LifecycleError;

/// Answers whether a customer identifier refers to a known customer.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn customer_exists(&self, customer_id: &CustomerId) -> Result<bool, LifecycleError>;
}

#[derive(Debug, Default)]
struct InMemoryCustomerState {
    customers: HashSet<CustomerId>,
    fail_on_lookup: bool,
}

/// In-memory customer directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    state: Arc<RwLock<InMemoryCustomerState>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory that knows the given customers.
    pub fn with_customers<I, C>(customers: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CustomerId>,
    {
        let state = InMemoryCustomerState {
            customers: customers.into_iter().map(Into::into).collect(),
            fail_on_lookup: false,
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn register(&self, customer_id: impl Into<CustomerId>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .customers
            .insert(customer_id.into());
    }

    /// Makes every future lookup fail with [`LifecycleError::CustomerService`].
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_lookup = fail;
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn customer_exists(&self, customer_id: &CustomerId) -> Result<bool, LifecycleError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_lookup {
            return Err(LifecycleError::CustomerService(
                "customer directory unavailable".to_string(),
            ));
        }
        Ok(state.customers.contains(customer_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_and_unknown_customers() {
        let directory = InMemoryCustomerDirectory::with_customers(["cus-123"]);
        assert!(directory.customer_exists(&"cus-123".into()).await.unwrap());
        assert!(!directory.customer_exists(&"cus-999".into()).await.unwrap());

        directory.register("cus-999");
        assert!(directory.customer_exists(&"cus-999".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let directory = InMemoryCustomerDirectory::with_customers(["cus-123"]);
        directory.set_fail_on_lookup(true);

        let result = directory.customer_exists(&"cus-123".into()).await;
        assert!(matches!(result, Err(LifecycleError::CustomerService(_))));
    }
}
