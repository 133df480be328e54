//! Per-operation input shapes.

use serde::Deserialize;

use super::{CustomerId, LineItem, OrderError, OrderFields, OrderStatus};

/// Input of the create flow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// The customer placing the order. The store requires one; a request
    /// without it fails after the tentative insert.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,

    /// The requested lines, passed to the reservation unmodified.
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl CreateOrderRequest {
    /// Creates a request for a customer.
    pub fn new(customer_id: impl Into<CustomerId>, items: Vec<LineItem>) -> Self {
        Self {
            customer_id: Some(customer_id.into()),
            items,
        }
    }
}

/// Field-level update of an order. Absent fields keep their current value.
///
/// `status` is kept as the raw string so that validation happens in the
/// lifecycle, not in deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tracking_company: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_link: Option<String>,
}

impl OrderPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_id(mut self, customer_id: impl Into<CustomerId>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn tracking_company(mut self, company: impl Into<String>) -> Self {
        self.tracking_company = Some(company.into());
        self
    }

    pub fn tracking_number(mut self, number: impl Into<String>) -> Self {
        self.tracking_number = Some(number.into());
        self
    }

    pub fn tracking_link(mut self, link: impl Into<String>) -> Self {
        self.tracking_link = Some(link.into());
        self
    }

    /// Parses the requested status, if any, ignoring case.
    pub fn parsed_status(&self) -> Result<Option<OrderStatus>, OrderError> {
        self.status.as_deref().map(str::parse).transpose()
    }

    /// Merges this patch over `current`.
    ///
    /// Fails without producing anything if the status is not recognised.
    pub fn apply_to(&self, current: OrderFields) -> Result<OrderFields, OrderError> {
        let status = self.parsed_status()?;

        Ok(OrderFields {
            customer_id: self.customer_id.clone().or(current.customer_id),
            status: status.unwrap_or(current.status),
            tracking_company: self.tracking_company.clone().or(current.tracking_company),
            tracking_number: self.tracking_number.clone().or(current.tracking_number),
            tracking_link: self.tracking_link.clone().or(current.tracking_link),
        })
    }
}
