//! Transaction HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - POST /api/v1/transactions - Validate and submit a card transaction
//! - GET /api/v1/transactions - Transaction history, newest first
//! - GET /api/v1/transactions/{reference} - Get transaction details

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::extract::RequestJson;
use crate::{
    error::AppError,
    models::transaction::{TransactionRequest, TransactionResponse},
    services::transaction_service::SharedTransactionService,
};

/// Submit a card transaction.
///
/// # Request Body
///
/// ```json
/// {
///   "terminal_number": "0882016016",
///   "terminal_password": "Z0882016016",
///   "card_number": "375510390507767",
///   "expiry_date": "12/27",
///   "cvv": "488",
///   "cardholder_name": "Test User",
///   "amount": 100.00,
///   "transaction_type": "sale"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: The record in its terminal state. A gateway decline or
///   timeout is still a 201; read `status` and `notification`.
/// - **422**: Validation failed, with a `fields` map. Nothing was sent.
/// - **400/415/422** `malformed_body`: the body is not JSON, or a value has the
///   wrong type (e.g. an unknown `transaction_type`).
pub async fn submit_transaction(
    State(service): State<SharedTransactionService>,
    RequestJson(request): RequestJson<TransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let record = service.submit(request).await?;
    Ok((StatusCode::CREATED, Json(TransactionResponse::from(&record))))
}

/// List all recorded transactions, newest first.
pub async fn list_transactions(
    State(service): State<SharedTransactionService>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let records = service.history().await?;
    Ok(Json(records.iter().map(TransactionResponse::from).collect()))
}

/// Get transaction by reference.
///
/// References contain a slash (`TRX/000042`), so the route captures the rest
/// of the path.
pub async fn get_transaction(
    State(service): State<SharedTransactionService>,
    Path(reference_id): Path<String>,
) -> Result<Json<TransactionResponse>, AppError> {
    let record = service.get(&reference_id).await?;
    Ok(Json(TransactionResponse::from(&record)))
}
