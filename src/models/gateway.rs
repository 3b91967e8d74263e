//! Wire types for the payment gateway's JSON contract.
//!
//! Key names follow the gateway's documented contract exactly, so every field
//! is renamed explicitly rather than relying on a blanket case conversion.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::transaction::mask_card_number;
use crate::services::validator::ValidatedRequest;

/// Outbound commit request.
///
/// # JSON Example
///
/// ```json
/// {
///   "TerminalNumber": "0882016016",
///   "Password": "Z0882016016",
///   "CardNumber": "375510390507767",
///   "ExpDate_MMYY": "1227",
///   "CVV": "488",
///   "CustomerName": "Test User",
///   "TransactionSum": 100.0,
///   "TransactionType": "01",
///   "J": 0,
///   "CreditType": 1,
///   "NumberOfPayments": 1
/// }
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayRequest {
    #[serde(rename = "TerminalNumber")]
    pub terminal_number: String,

    #[serde(rename = "Password")]
    pub password: String,

    #[serde(rename = "CardNumber")]
    pub card_number: String,

    /// `MM` followed by two-digit `YY`
    #[serde(rename = "ExpDate_MMYY")]
    pub exp_date_mmyy: String,

    #[serde(rename = "CVV")]
    pub cvv: String,

    #[serde(rename = "CustomerName")]
    pub customer_name: String,

    #[serde(rename = "TransactionSum", with = "rust_decimal::serde::float")]
    pub transaction_sum: Decimal,

    /// "01" regular debit, "53" refund
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,

    /// 0 charge, 5 authorization only
    #[serde(rename = "J")]
    pub j: u8,

    #[serde(rename = "CreditType", default = "default_one")]
    pub credit_type: u8,

    #[serde(rename = "NumberOfPayments", default = "default_one")]
    pub number_of_payments: u8,
}

fn default_one() -> u8 {
    1
}

impl From<&ValidatedRequest> for GatewayRequest {
    fn from(request: &ValidatedRequest) -> Self {
        let transaction_type = request.transaction_type();
        Self {
            terminal_number: request.terminal_number().to_string(),
            password: request.terminal_password().to_string(),
            card_number: request.card_number().to_string(),
            exp_date_mmyy: request.expiry().mmyy(),
            cvv: request.cvv().to_string(),
            customer_name: request.cardholder_name().to_string(),
            transaction_sum: request.amount(),
            transaction_type: transaction_type.gateway_code().to_string(),
            j: transaction_type.j_code(),
            credit_type: 1,
            number_of_payments: 1,
        }
    }
}

impl fmt::Debug for GatewayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayRequest")
            .field("terminal_number", &self.terminal_number)
            .field("password", &"***")
            .field("card_number", &mask_card_number(&self.card_number))
            .field("exp_date_mmyy", &self.exp_date_mmyy)
            .field("cvv", &"***")
            .field("customer_name", &self.customer_name)
            .field("transaction_sum", &self.transaction_sum)
            .field("transaction_type", &self.transaction_type)
            .field("j", &self.j)
            .finish()
    }
}

/// Inbound gateway response.
///
/// `HasError` and `ReturnCode` are mandatory; a body without them is treated
/// as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    #[serde(rename = "HasError")]
    pub has_error: bool,

    /// 0 means approved, anything else is a decline or error reason
    #[serde(rename = "ReturnCode")]
    pub return_code: i64,

    #[serde(rename = "ReturnMessage", default, skip_serializing_if = "Option::is_none")]
    pub return_message: Option<String>,

    #[serde(rename = "ReferenceNumber", default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,

    #[serde(rename = "ApprovalNumber", default, skip_serializing_if = "Option::is_none")]
    pub approval_number: Option<String>,
}

impl GatewayResponse {
    /// A declined response carrying only a code and message.
    pub fn declined(return_code: i64, message: impl Into<String>) -> Self {
        Self {
            has_error: true,
            return_code,
            return_message: Some(message.into()),
            reference_number: None,
            approval_number: None,
        }
    }
}
