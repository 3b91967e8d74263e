//! Business-rule denials evaluated before any network call.
//!
//! These checks run on input that already passed field validation. A denial
//! produces a failed transaction without contacting the gateway, using the
//! gateway's own decline codes so the stored record reads the same as a real
//! decline.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::gateway::GatewayResponse;
use crate::models::transaction::TransactionType;
use crate::services::validator::ValidatedRequest;

pub const STOLEN_CARD_CODE: i64 = 205;
pub const CREDIT_LIMIT_CODE: i64 = 206;
pub const REFUND_LIMIT_CODE: i64 = 207;

/// Cards reported stolen or lost in the gateway's test scenarios.
pub const DEFAULT_BLOCKED_CARDS: &[&str] = &["4532015112830366", "5425233010103442"];

/// Why a transaction was refused before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightDenial {
    pub return_code: i64,
    pub message: String,
}

impl PreflightDenial {
    fn new(return_code: i64, message: &str) -> Self {
        Self {
            return_code,
            message: message.to_string(),
        }
    }

    /// The denial expressed as a gateway response body.
    pub fn to_gateway_response(&self) -> GatewayResponse {
        GatewayResponse::declined(self.return_code, self.message.clone())
    }
}

/// Thresholds and block lists applied before submission.
#[derive(Debug, Clone)]
pub struct PreflightPolicy {
    pub blocked_cards: Vec<String>,

    /// Any transaction above this amount is refused
    pub credit_limit: Decimal,

    /// Refunds above this amount are refused
    pub refund_limit: Decimal,
}

impl Default for PreflightPolicy {
    fn default() -> Self {
        Self {
            blocked_cards: DEFAULT_BLOCKED_CARDS.iter().map(|c| c.to_string()).collect(),
            credit_limit: dec!(5000),
            refund_limit: dec!(1000),
        }
    }
}

impl PreflightPolicy {
    /// Return the first rule the request breaks, if any.
    ///
    /// Rules are checked in a fixed order: blocked card, credit limit,
    /// refund limit.
    pub fn evaluate(&self, request: &ValidatedRequest) -> Option<PreflightDenial> {
        if self
            .blocked_cards
            .iter()
            .any(|card| card == request.card_number())
        {
            return Some(PreflightDenial::new(
                STOLEN_CARD_CODE,
                "Card Declined - Do Not Honor (Card is reported stolen/lost)",
            ));
        }

        if request.amount() > self.credit_limit {
            return Some(PreflightDenial::new(
                CREDIT_LIMIT_CODE,
                "Insufficient Funds - Amount exceeds credit limit",
            ));
        }

        if request.transaction_type() == TransactionType::Refund
            && request.amount() > self.refund_limit
        {
            return Some(PreflightDenial::new(
                REFUND_LIMIT_CODE,
                "Transaction Not Allowed - Refund limit exceeded",
            ));
        }

        None
    }
}
