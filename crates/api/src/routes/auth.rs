//! API key guard for the order routes.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::AuthConfig;
use crate::error::ApiError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `x-api-key` header does not match the configured key.
pub async fn require_api_key(
    State(auth): State<Arc<AuthConfig>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if !auth.permits(presented) {
        tracing::warn!(path = %req.uri().path(), "rejected request with invalid API key");
        return ApiError::Unauthorized.into_response();
    }

    next.run(req).await
}
