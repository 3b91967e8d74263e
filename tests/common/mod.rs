#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use card_gateway::models::gateway::{GatewayRequest, GatewayResponse};
use card_gateway::models::transaction::{TransactionRequest, TransactionType};
use card_gateway::services::gateway_client::{GatewayOutcome, PaymentGateway};
use card_gateway::services::reference::SequentialReferenceGenerator;
use card_gateway::services::transaction_service::TransactionService;
use card_gateway::services::validator::Clock;
use card_gateway::store::InMemoryTransactionStore;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

/// The transaction used by the end-to-end scenarios.
pub fn scenario_request() -> TransactionRequest {
    TransactionRequest {
        terminal_number: "0882016016".to_string(),
        terminal_password: "Z0882016016".to_string(),
        card_number: "375510390507767".to_string(),
        expiry_date: "12/25".to_string(),
        cvv: "488".to_string(),
        cardholder_name: "Test User".to_string(),
        amount: dec!(100.00),
        transaction_type: TransactionType::Sale,
    }
}

/// A date at which the scenario card is still valid.
pub fn scenario_clock() -> Clock {
    Clock::Fixed(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

pub fn service_with(gateway: Arc<dyn PaymentGateway>) -> (TransactionService, InMemoryTransactionStore) {
    let store = InMemoryTransactionStore::new();
    let service = TransactionService::new(
        gateway,
        Arc::new(store.clone()),
        Arc::new(SequentialReferenceGenerator::default()),
    )
    .with_clock(scenario_clock());
    (service, store)
}

/// Gateway double that counts calls and always approves.
#[derive(Default)]
pub struct CountingGateway {
    calls: AtomicUsize,
}

impl CountingGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for CountingGateway {
    async fn submit(&self, _request: &GatewayRequest) -> GatewayOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = GatewayResponse {
            has_error: false,
            return_code: 0,
            return_message: Some("Transaction Approved".to_string()),
            reference_number: Some("12345".to_string()),
            approval_number: None,
        };
        GatewayOutcome::Responded {
            http_status: 200,
            body: serde_json::to_string(&response).unwrap(),
            response,
        }
    }
}

/// An endpoint that accepts connections and never answers.
pub async fn silent_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{addr}/commit")
}

/// An endpoint nothing is listening on.
pub fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/commit")
}
