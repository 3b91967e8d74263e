//! Error types and HTTP error response handling.
//!
//! Gateway problems (timeouts, declines, malformed bodies) are not errors at
//! this level: they end up as a terminal record state. What remains here is
//! input the caller must fix and failures of the surrounding service.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::transaction::TransitionError;
use crate::services::validator::ValidationErrors;
use crate::store::StoreError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Validation Errors**: Input rejected before any network activity
/// - **Request Errors**: Body is not JSON or has values of the wrong type
/// - **Resource Errors**: Requested transaction not found
/// - **Storage Errors**: Record store unavailable or inconsistent
/// - **Lifecycle Errors**: A record was driven through an illegal transition
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One or more fields failed validation.
    ///
    /// Returns HTTP 422 Unprocessable Entity with a field map.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Request body could not be deserialized.
    ///
    /// Keeps the extractor's status (400, 415 or 422).
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),

    /// No transaction with the given reference.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Record store failure.
    ///
    /// Returns HTTP 500 Internal Server Error (hides details from client).
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Illegal status transition.
    ///
    /// Returns HTTP 500 Internal Server Error.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "validation_failed",
///     "message": "One or more fields are invalid",
///     "fields": { "cvv": "CVV must be 3 or 4 digits." }
///   }
/// }
/// ```
///
/// `fields` is only present for validation errors.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "error": {
                        "code": "validation_failed",
                        "message": "One or more fields are invalid",
                        "fields": errors.to_field_map(),
                    }
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::MalformedBody(rejection) => {
                (rejection.status(), "malformed_body", rejection.body_text())
            }
            AppError::TransactionNotFound(_) => (
                StatusCode::NOT_FOUND,
                "transaction_not_found",
                self.to_string(),
            ),
            AppError::Store(_) | AppError::Transition(_) => {
                tracing::error!(error = %self, "Internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let (status, code, message) = body;
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
