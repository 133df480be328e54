//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifecycle::LifecycleError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No live order matches the request.
    NotFound,
    /// Missing or wrong `x-api-key` header.
    Unauthorized,
    /// Lifecycle error.
    Lifecycle(LifecycleError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid API key".to_string()),
            ApiError::Lifecycle(err) => lifecycle_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn lifecycle_error_to_response(err: LifecycleError) -> (StatusCode, String) {
    match &err {
        LifecycleError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
        LifecycleError::InvalidStatus(_) => {
            (StatusCode::BAD_REQUEST, "Invalid order status".to_string())
        }
        LifecycleError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        LifecycleError::UnknownCustomer(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        LifecycleError::Persistence(_)
        | LifecycleError::Inventory(_)
        | LifecycleError::CustomerService(_)
        | LifecycleError::Notifier(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        ApiError::Lifecycle(err)
    }
}
