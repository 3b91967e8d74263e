//! Sandbox gateway for local testing.
//!
//! Answers commit requests the way the gateway's test environment does, so a
//! development deployment can set `GATEWAY_URL` to its own
//! `/sandbox/gateway` route. Only compiled with the `sandbox-gateway`
//! feature.

use axum::{Json, http::StatusCode};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::gateway::{GatewayRequest, GatewayResponse};

/// Test terminal accepted by the sandbox.
pub const SANDBOX_TERMINAL_NUMBER: &str = "0882016016";
pub const SANDBOX_TERMINAL_PASSWORD: &str = "Z0882016016";

pub const INVALID_CARD_FORMAT_CODE: i64 = 106;
pub const AUTHENTICATION_FAILED_CODE: i64 = 101;
pub const INVALID_AMOUNT_CODE: i64 = 102;

/// Emulated commit endpoint.
///
/// Checks run in order:
/// 1. Card shorter than 15 digits -> 400, code 106
/// 2. Unknown terminal or wrong password -> 401, code 101
/// 3. Non-positive sum -> 400, code 102
/// 4. Otherwise -> 200, approved with a fresh reference number
pub async fn commit_transaction(
    Json(request): Json<GatewayRequest>,
) -> (StatusCode, Json<GatewayResponse>) {
    tracing::debug!(request = ?request, "Sandbox gateway received commit");

    if request.card_number.len() < 15 {
        return (
            StatusCode::BAD_REQUEST,
            Json(GatewayResponse::declined(
                INVALID_CARD_FORMAT_CODE,
                "Invalid Card Format",
            )),
        );
    }

    if request.terminal_number != SANDBOX_TERMINAL_NUMBER
        || request.password != SANDBOX_TERMINAL_PASSWORD
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(GatewayResponse::declined(
                AUTHENTICATION_FAILED_CODE,
                "Authentication Failed: Invalid Terminal ID or Password",
            )),
        );
    }

    if request.transaction_sum <= Decimal::ZERO {
        return (
            StatusCode::BAD_REQUEST,
            Json(GatewayResponse::declined(INVALID_AMOUNT_CODE, "Invalid Amount")),
        );
    }

    (
        StatusCode::OK,
        Json(GatewayResponse {
            has_error: false,
            return_code: 0,
            return_message: Some("Transaction Approved".to_string()),
            reference_number: Some(Uuid::new_v4().simple().to_string()),
            approval_number: None,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> GatewayRequest {
        GatewayRequest {
            terminal_number: SANDBOX_TERMINAL_NUMBER.to_string(),
            password: SANDBOX_TERMINAL_PASSWORD.to_string(),
            card_number: "375510390507767".to_string(),
            exp_date_mmyy: "1227".to_string(),
            cvv: "488".to_string(),
            customer_name: "Test User".to_string(),
            transaction_sum: dec!(100),
            transaction_type: "01".to_string(),
            j: 0,
            credit_type: 1,
            number_of_payments: 1,
        }
    }

    #[tokio::test]
    async fn test_approves_valid_request() {
        let (status, Json(response)) = commit_transaction(Json(request())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!response.has_error);
        assert_eq!(response.return_code, 0);
        assert!(response.reference_number.is_some());
    }

    #[tokio::test]
    async fn test_short_card_rejected_first() {
        let mut req = request();
        req.card_number = "41111111111111".to_string();
        req.password = "wrong".to_string();
        let (status, Json(response)) = commit_transaction(Json(req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response.return_code, INVALID_CARD_FORMAT_CODE);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let mut req = request();
        req.password = "wrong".to_string();
        let (status, Json(response)) = commit_transaction(Json(req)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(response.has_error);
        assert_eq!(response.return_code, AUTHENTICATION_FAILED_CODE);
    }

    #[tokio::test]
    async fn test_non_positive_amount() {
        let mut req = request();
        req.transaction_sum = dec!(0);
        let (status, Json(response)) = commit_transaction(Json(req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response.return_code, INVALID_AMOUNT_CODE);
    }
}
