//! HTTP request handlers (route handlers).
//!
//! Handlers are thin: they deserialize the request, call the
//! [`TransactionService`](crate::services::transaction_service::TransactionService)
//! and turn the record into a masked response.

/// JSON extractor with application error rejections
pub mod extract;
/// Health check endpoint
pub mod health;
/// Emulated gateway for local testing
#[cfg(feature = "sandbox-gateway")]
pub mod sandbox;
/// Card transaction endpoints
pub mod transactions;

use axum::{
    Router,
    routing::{get, post},
};

use crate::services::transaction_service::SharedTransactionService;

/// Build the application router.
pub fn router(service: SharedTransactionService) -> Router {
    let app = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/transactions",
            post(transactions::submit_transaction).get(transactions::list_transactions),
        )
        .route(
            "/api/v1/transactions/{*reference}",
            get(transactions::get_transaction),
        );

    // Never enable in production: answers as if it were the gateway
    #[cfg(feature = "sandbox-gateway")]
    let app = app.route("/sandbox/gateway", post(sandbox::commit_transaction));

    app.with_state(service)
}
