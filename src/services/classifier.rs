//! Maps a gateway outcome to a terminal transaction state.
//!
//! A transaction is approved only when all three hold at once: HTTP 200,
//! `HasError == false` and `ReturnCode == 0`. A 200 can still carry a
//! business decline, so the HTTP status alone never decides.
//!
//! Pending versus failed: if no complete HTTP response was received the
//! outcome is `pending`; once any response arrives it is judged by the
//! predicate, and an undecodable body is `failed`.

use crate::models::gateway::GatewayResponse;
use crate::models::transaction::TransactionStatus;
use crate::services::gateway_client::GatewayOutcome;
use crate::services::preflight::PreflightDenial;

pub const MALFORMED_RESPONSE_MESSAGE: &str =
    "Invalid API Response: malformed gateway response. Please contact support.";
pub const TIMEOUT_MESSAGE: &str =
    "API Request Timeout: the gateway did not respond in time. Transaction status is pending.";
pub const CONNECTION_MESSAGE: &str =
    "Connection Error: cannot reach the payment gateway. Transaction status is pending.";

/// Everything a record needs to reach its terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: TransactionStatus,
    pub http_status: Option<u16>,
    pub return_code: Option<i64>,

    /// Text safe to show the end user
    pub message: String,

    /// What gets stored for audit
    pub raw_response: String,
}

/// The success predicate.
pub fn is_approved(http_status: u16, response: &GatewayResponse) -> bool {
    http_status == 200 && !response.has_error && response.return_code == 0
}

/// Classify the outcome of one gateway round trip.
pub fn classify(outcome: &GatewayOutcome) -> Classification {
    match outcome {
        GatewayOutcome::Responded {
            http_status,
            body,
            response,
        } => classify_parsed(*http_status, body, response),
        GatewayOutcome::DecodeFailure {
            http_status, body, ..
        } => malformed(*http_status, body),
        GatewayOutcome::Timeout { detail } => Classification {
            status: TransactionStatus::Pending,
            http_status: None,
            return_code: None,
            message: TIMEOUT_MESSAGE.to_string(),
            raw_response: format!("API Request Timeout: {detail}"),
        },
        GatewayOutcome::ConnectionFailure { detail } => Classification {
            status: TransactionStatus::Pending,
            http_status: None,
            return_code: None,
            message: CONNECTION_MESSAGE.to_string(),
            raw_response: format!("Connection Error: {detail}"),
        },
    }
}

/// Classify a stored response body.
///
/// Pure over its inputs, so re-running it on a stored record always yields
/// the status the record was given.
pub fn classify_response(http_status: u16, body: &str) -> Classification {
    match serde_json::from_str::<GatewayResponse>(body) {
        Ok(response) => classify_parsed(http_status, body, &response),
        Err(_) => malformed(http_status, body),
    }
}

/// Classify a preflight denial; no network call was made.
pub fn classify_denial(denial: &PreflightDenial) -> Classification {
    let response = denial.to_gateway_response();
    let raw_response = serde_json::to_string_pretty(&response)
        .unwrap_or_else(|_| format!("{{\"HasError\":true,\"ReturnCode\":{}}}", denial.return_code));

    Classification {
        status: TransactionStatus::Failed,
        http_status: None,
        return_code: Some(denial.return_code),
        message: format!(
            "Transaction Failed (return code {}): {}",
            denial.return_code, denial.message
        ),
        raw_response,
    }
}

fn classify_parsed(http_status: u16, body: &str, response: &GatewayResponse) -> Classification {
    if is_approved(http_status, response) {
        return Classification {
            status: TransactionStatus::Success,
            http_status: Some(http_status),
            return_code: Some(response.return_code),
            message: response
                .return_message
                .clone()
                .unwrap_or_else(|| "Transaction approved".to_string()),
            raw_response: body.to_string(),
        };
    }

    let gateway_message = response
        .return_message
        .as_deref()
        .unwrap_or("Unknown error occurred");
    let message = if http_status == 200 {
        format!(
            "Transaction Failed (return code {}): {}",
            response.return_code, gateway_message
        )
    } else {
        format!(
            "Transaction Failed (HTTP {}, return code {}): {}",
            http_status, response.return_code, gateway_message
        )
    };

    Classification {
        status: TransactionStatus::Failed,
        http_status: Some(http_status),
        return_code: Some(response.return_code),
        message,
        raw_response: body.to_string(),
    }
}

fn malformed(http_status: u16, body: &str) -> Classification {
    Classification {
        status: TransactionStatus::Failed,
        http_status: Some(http_status),
        return_code: None,
        message: MALFORMED_RESPONSE_MESSAGE.to_string(),
        raw_response: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responded(http_status: u16, has_error: bool, return_code: i64) -> GatewayOutcome {
        let body = format!(
            r#"{{"HasError":{has_error},"ReturnCode":{return_code},"ReturnMessage":"msg {return_code}"}}"#
        );
        let response = serde_json::from_str(&body).unwrap();
        GatewayOutcome::Responded {
            http_status,
            body,
            response,
        }
    }

    #[test]
    fn test_truth_table() {
        use TransactionStatus::*;
        let cases = [
            (200, false, 0, Success),
            (200, false, -1, Failed),
            (200, false, 33, Failed),
            (200, true, 0, Failed),
            (200, true, 101, Failed),
            (201, false, 0, Failed),
            (400, false, 0, Failed),
            (401, true, 101, Failed),
            (500, false, 0, Failed),
        ];

        for (http_status, has_error, return_code, expected) in cases {
            let result = classify(&responded(http_status, has_error, return_code));
            assert_eq!(
                result.status, expected,
                "HTTP {http_status}, HasError {has_error}, ReturnCode {return_code}"
            );
        }
    }

    #[test]
    fn test_timeout_is_pending() {
        let result = classify(&GatewayOutcome::Timeout {
            detail: "operation timed out".to_string(),
        });
        assert_eq!(result.status, TransactionStatus::Pending);
        assert!(result.message.contains("Timeout"));
        assert!(result.raw_response.contains("operation timed out"));
        assert!(!result.message.contains("operation timed out"));
    }

    #[test]
    fn test_connection_failure_is_pending() {
        let result = classify(&GatewayOutcome::ConnectionFailure {
            detail: "connection refused".to_string(),
        });
        assert_eq!(result.status, TransactionStatus::Pending);
        assert!(result.message.contains("Connection Error"));
        assert!(!result.message.contains("refused"));
    }

    #[test]
    fn test_decode_failure_is_failed_and_keeps_body() {
        let result = classify(&GatewayOutcome::DecodeFailure {
            http_status: 200,
            body: "<html>oops</html>".to_string(),
            detail: "expected value".to_string(),
        });
        assert_eq!(result.status, TransactionStatus::Failed);
        assert_eq!(result.message, MALFORMED_RESPONSE_MESSAGE);
        assert_eq!(result.raw_response, "<html>oops</html>");
    }

    #[test]
    fn test_decline_surfaces_gateway_code_and_message() {
        let result = classify(&responded(200, false, -1));
        assert!(result.message.contains("-1"));
        assert!(result.message.contains("msg -1"));
        assert_eq!(result.return_code, Some(-1));

        let result = classify(&responded(401, true, 101));
        assert!(result.message.contains("HTTP 401"));
    }

    #[test]
    fn test_reclassifying_stored_response_is_idempotent() {
        for outcome in [
            responded(200, false, 0),
            responded(200, false, 7),
            responded(502, true, 1),
        ] {
            let first = classify(&outcome);
            let http_status = first.http_status.unwrap();
            let again = classify_response(http_status, &first.raw_response);
            assert_eq!(first, again);
            assert_eq!(again, classify_response(http_status, &first.raw_response));
        }

        let garbage = classify_response(200, "not json");
        assert_eq!(garbage.status, TransactionStatus::Failed);
        assert_eq!(garbage, classify_response(200, "not json"));
    }

    #[test]
    fn test_denial_classification() {
        let denial = PreflightDenial {
            return_code: 205,
            message: "Card Declined".to_string(),
        };
        let result = classify_denial(&denial);
        assert_eq!(result.status, TransactionStatus::Failed);
        assert_eq!(result.return_code, Some(205));
        assert!(result.http_status.is_none());

        let stored: GatewayResponse = serde_json::from_str(&result.raw_response).unwrap();
        assert!(stored.has_error);
        assert_eq!(stored.return_code, 205);
    }
}
