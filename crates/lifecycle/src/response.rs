//! The structured `{data, message, success}` answer of mutating operations.

use serde::Serialize;

/// Outcome of a mutating lifecycle operation.
///
/// Failures never carry internal error detail in `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResponse<T> {
    pub data: Option<T>,
    pub message: String,
    pub success: bool,
}

impl<T> OperationResponse<T> {
    pub fn success(data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }

    pub fn failure(data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
