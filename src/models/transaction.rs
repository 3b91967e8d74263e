//! Card transaction data models and API request/response types.
//!
//! This module defines:
//! - `TransactionRequest`: Raw card-payment input submitted by a caller
//! - `TransactionStatus`: The record lifecycle state machine
//! - `TransactionRecord`: The auditable record of one submission attempt
//! - `TransactionResponse`: Masked view returned to clients

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::gateway::GatewayResponse;
use crate::services::classifier::Classification;

/// Kind of card operation requested from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Regular charge (`J=0`)
    #[default]
    Sale,
    /// Authorization only, no capture (`J=5`)
    Authorize,
    /// Credit back to the card (`J=0`, refund transaction type)
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Authorize => "authorize",
            TransactionType::Refund => "refund",
        }
    }

    /// Gateway `J` parameter for this operation.
    pub fn j_code(&self) -> u8 {
        match self {
            TransactionType::Sale | TransactionType::Refund => 0,
            TransactionType::Authorize => 5,
        }
    }

    /// Gateway `TransactionType` parameter ("01" debit, "53" credit/refund).
    pub fn gateway_code(&self) -> &'static str {
        match self {
            TransactionType::Sale | TransactionType::Authorize => "01",
            TransactionType::Refund => "53",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionType::Sale),
            "authorize" => Ok(TransactionType::Authorize),
            "refund" => Ok(TransactionType::Refund),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Raw card-payment input as submitted by the caller.
///
/// Nothing here is trusted until it passes through
/// [`validate_all`](crate::services::validator::validate_all). Absent fields
/// deserialize as empty (amount zero) so they are reported by validation.
///
/// # JSON Example
///
/// ```json
/// {
///   "terminal_number": "0882016016",
///   "terminal_password": "Z0882016016",
///   "card_number": "3755 103905 07767",
///   "expiry_date": "12/27",
///   "cvv": "488",
///   "cardholder_name": "Test User",
///   "amount": 100.00,
///   "transaction_type": "sale"
/// }
/// ```
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionRequest {
    /// Gateway terminal identifier (supplied per request, never from config)
    pub terminal_number: String,

    /// Gateway terminal password
    ///
    /// Never logged and never returned to clients.
    pub terminal_password: String,

    /// Card number, spaces allowed
    pub card_number: String,

    /// Expiry in `MM/YY` format
    pub expiry_date: String,

    /// Card verification value (3 or 4 digits)
    pub cvv: String,

    /// Name as printed on the card
    pub cardholder_name: String,

    /// Transaction amount in major currency units
    pub amount: Decimal,

    /// Operation to perform (defaults to sale)
    pub transaction_type: TransactionType,
}

impl fmt::Debug for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRequest")
            .field("terminal_number", &self.terminal_number)
            .field("terminal_password", &"***")
            .field("card_number", &mask_card_number(&self.card_number))
            .field("expiry_date", &self.expiry_date)
            .field("cvv", &"***")
            .field("cardholder_name", &self.cardholder_name)
            .field("amount", &self.amount)
            .field("transaction_type", &self.transaction_type)
            .finish()
    }
}

/// Mask a card number down to its last four digits.
///
/// Whitespace is ignored, so `"3755 103905 07767"` becomes `"***********7767"`.
pub fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(|c| !c.is_whitespace()).collect();
    let visible = digits.len().saturating_sub(4);
    digits
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

/// Lifecycle state of a transaction record.
///
/// ```text
/// draft ──> processing ──> success
///                     ├──> failed
///                     └──> pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Draft,
    Processing,
    Success,
    Failed,
    /// No definitive gateway verdict (timeout or no response received)
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Draft => "draft",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Pending => "pending",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Success | TransactionStatus::Failed | TransactionStatus::Pending
        )
    }

    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        match self {
            TransactionStatus::Draft => next == TransactionStatus::Processing,
            TransactionStatus::Processing => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TransactionStatus::Draft),
            "processing" => Ok(TransactionStatus::Processing),
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            "pending" => Ok(TransactionStatus::Pending),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// Rejected attempt to move a record through its lifecycle out of order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status transition for {reference_id}: {from} -> {to}")]
pub struct TransitionError {
    pub reference_id: String,
    pub from: TransactionStatus,
    pub to: TransactionStatus,
}

/// The auditable record of one submission attempt.
///
/// # Invariants
///
/// - `reference_id` is assigned at creation and never changes
/// - `status` only moves draft -> processing -> {success | failed | pending}
/// - `raw_response` is written exactly once, together with the terminal status
///
/// A retry is a new record with a new reference.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    reference_id: String,
    request: TransactionRequest,
    status: TransactionStatus,
    raw_response: Option<String>,
    http_status: Option<u16>,
    return_code: Option<i64>,
    message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a new record in `draft` state.
    pub fn new(reference_id: String, request: TransactionRequest) -> Self {
        let now = Utc::now();
        Self {
            reference_id,
            request,
            status: TransactionStatus::Draft,
            raw_response: None,
            http_status: None,
            return_code: None,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a record loaded from storage.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        reference_id: String,
        request: TransactionRequest,
        status: TransactionStatus,
        raw_response: Option<String>,
        http_status: Option<u16>,
        return_code: Option<i64>,
        message: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            reference_id,
            request,
            status,
            raw_response,
            http_status,
            return_code,
            message,
            created_at,
            updated_at,
        }
    }

    /// Mark the record as having an outstanding attempt.
    pub fn begin_processing(&mut self) -> Result<(), TransitionError> {
        self.transition(TransactionStatus::Processing)
    }

    /// Record the terminal outcome of the attempt.
    ///
    /// Fails if the record is not `processing` or the classification is not
    /// terminal. The record is left untouched on failure.
    pub fn finalize(&mut self, classification: Classification) -> Result<(), TransitionError> {
        self.transition(classification.status)?;
        self.raw_response = Some(classification.raw_response);
        self.http_status = classification.http_status;
        self.return_code = classification.return_code;
        self.message = Some(classification.message);
        Ok(())
    }

    fn transition(&mut self, next: TransactionStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                reference_id: self.reference_id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Exact gateway body, or an error description when nothing was received.
    pub fn raw_response(&self) -> Option<&str> {
        self.raw_response.as_deref()
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn return_code(&self) -> Option<i64> {
        self.return_code
    }

    /// Human-readable outcome for display.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Response returned for transaction operations.
///
/// Card numbers are masked; the terminal password and CVV are never included.
/// `gateway_response` carries the stored raw response only when it decodes as
/// a gateway reply, and only the documented gateway fields of it. Transport
/// errors and malformed bodies stay in storage and the operator logs.
///
/// `amount` serializes as a JSON number.
///
/// # JSON Example
///
/// ```json
/// {
///   "reference_id": "TRX/000042",
///   "transaction_type": "sale",
///   "amount": 100.0,
///   "card_number": "***********7767",
///   "expiry_date": "12/27",
///   "cardholder_name": "Test User",
///   "terminal_number": "0882016016",
///   "status": "success",
///   "notification": "success",
///   "message": "Transaction Approved",
///   "return_code": 0,
///   "http_status": 200,
///   "gateway_response": { "HasError": false, "ReturnCode": 0 },
///   "created_at": "2025-12-21T16:00:00Z",
///   "updated_at": "2025-12-21T16:00:01Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub reference_id: String,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub card_number: String,
    pub expiry_date: String,
    pub cardholder_name: String,
    pub terminal_number: String,
    pub status: TransactionStatus,

    /// Notification style for the caller's UI: "success" or "danger"
    pub notification: &'static str,
    pub message: Option<String>,
    pub return_code: Option<i64>,
    pub http_status: Option<u16>,
    pub gateway_response: Option<GatewayResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TransactionRecord> for TransactionResponse {
    fn from(record: &TransactionRecord) -> Self {
        let request = record.request();
        let notification = match record.status() {
            TransactionStatus::Success => "success",
            _ => "danger",
        };
        let gateway_response = record
            .raw_response()
            .and_then(|raw| serde_json::from_str::<GatewayResponse>(raw).ok());

        Self {
            reference_id: record.reference_id().to_string(),
            transaction_type: request.transaction_type,
            amount: request.amount,
            card_number: mask_card_number(&request.card_number),
            expiry_date: request.expiry_date.clone(),
            cardholder_name: request.cardholder_name.clone(),
            terminal_number: request.terminal_number.clone(),
            status: record.status(),
            notification,
            message: record.message().map(str::to_string),
            return_code: record.return_code(),
            http_status: record.http_status(),
            gateway_response,
            created_at: record.created_at(),
            updated_at: record.updated_at(),
        }
    }
}
