//! HTTP client for the payment gateway.
//!
//! One call to [`PaymentGateway::submit`] performs exactly one POST and
//! reports what happened as a [`GatewayOutcome`] value. Nothing is raised and
//! nothing is retried here; retries are a caller concern and create a new
//! record.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::models::gateway::{GatewayRequest, GatewayResponse};
use crate::models::transaction::mask_card_number;

/// Default bound on a gateway round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one gateway round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome {
    /// A response arrived and its body matched the gateway contract.
    Responded {
        http_status: u16,
        body: String,
        response: GatewayResponse,
    },

    /// No complete response within the bounded wait.
    Timeout { detail: String },

    /// Transport failure (DNS, refused connection, TLS) with no response.
    ConnectionFailure { detail: String },

    /// A response arrived but its body is not a gateway response document.
    DecodeFailure {
        http_status: u16,
        body: String,
        detail: String,
    },
}

/// Anything that can carry a commit request to the gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn submit(&self, request: &GatewayRequest) -> GatewayOutcome;
}

/// Gateway reached over HTTPS with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    endpoint: String,
}

impl HttpGateway {
    /// Build a client for `endpoint` whose calls give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn submit(&self, request: &GatewayRequest) -> GatewayOutcome {
        tracing::info!(
            endpoint = %self.endpoint,
            terminal = %request.terminal_number,
            card = %mask_card_number(&request.card_number),
            amount = %request.transaction_sum,
            j = request.j,
            "Submitting transaction to gateway"
        );

        let response = match self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };

        let http_status = response.status().as_u16();

        // A body cut off mid-read is still "no complete response"
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return transport_failure(e),
        };

        match serde_json::from_str::<GatewayResponse>(&body) {
            Ok(parsed) => {
                tracing::info!(
                    http_status,
                    has_error = parsed.has_error,
                    return_code = parsed.return_code,
                    "Gateway responded"
                );
                GatewayOutcome::Responded {
                    http_status,
                    body,
                    response: parsed,
                }
            }
            Err(e) => {
                tracing::error!(http_status, error = %e, "Gateway returned an undecodable body");
                GatewayOutcome::DecodeFailure {
                    http_status,
                    body,
                    detail: e.to_string(),
                }
            }
        }
    }
}

fn transport_failure(error: reqwest::Error) -> GatewayOutcome {
    if error.is_timeout() {
        tracing::error!(error = %error, "Gateway request timed out");
        GatewayOutcome::Timeout {
            detail: error.to_string(),
        }
    } else {
        tracing::error!(error = ?error, "Gateway connection failed");
        GatewayOutcome::ConnectionFailure {
            detail: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_gateway_creation() {
        let gateway = HttpGateway::new("https://gateway.example.com/commit", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(gateway.endpoint(), "https://gateway.example.com/commit");
    }
}
