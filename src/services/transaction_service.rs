//! Transaction service - submission flow for card transactions.
//!
//! This service handles:
//! - Field validation before anything is persisted
//! - Reference assignment and record lifecycle
//! - Preflight business-rule denials
//! - The single gateway round trip and its classification
//!
//! # Process
//!
//! 1. Validate every field (no record is created on failure)
//! 2. Draw a reference and store the record as `draft`
//! 3. Move it to `processing`
//! 4. Deny by preflight rule, or submit to the gateway once
//! 5. Classify and store the terminal state
//!
//! Gateway problems never surface as errors here: they end as a `failed` or
//! `pending` record carrying a message for the user. Once the gateway has been
//! called, a store failure does not turn into an error either: the outcome is
//! returned, and a record the store could not finalize is logged for
//! reconciliation.

use std::sync::Arc;

use crate::{
    error::AppError,
    models::{
        gateway::GatewayRequest,
        transaction::{TransactionRecord, TransactionRequest, mask_card_number},
    },
    services::{
        classifier,
        gateway_client::PaymentGateway,
        preflight::PreflightPolicy,
        reference::ReferenceGenerator,
        validator::{self, Clock},
    },
    store::TransactionStore,
};

/// Writes of the terminal state tried before giving up on the store.
const OUTCOME_WRITE_ATTEMPTS: usize = 3;

/// Handle to the submission flow shared across request handlers.
pub type SharedTransactionService = Arc<TransactionService>;

pub struct TransactionService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn TransactionStore>,
    references: Arc<dyn ReferenceGenerator>,
    preflight: PreflightPolicy,
    clock: Clock,
}

impl TransactionService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn TransactionStore>,
        references: Arc<dyn ReferenceGenerator>,
    ) -> Self {
        Self {
            gateway,
            store,
            references,
            preflight: PreflightPolicy::default(),
            clock: Clock::System,
        }
    }

    pub fn with_preflight(mut self, preflight: PreflightPolicy) -> Self {
        self.preflight = preflight;
        self
    }

    /// Override the date used for expiry checks.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Validate, submit and record one transaction attempt.
    ///
    /// # Returns
    ///
    /// The stored record in a terminal state (`success`, `failed` or `pending`).
    ///
    /// # Errors
    ///
    /// - `Validation`: input rejected; nothing was stored or sent
    /// - `Store`: the record store failed before the gateway was contacted
    /// - `Transition`: the record lifecycle was violated
    pub async fn submit(&self, request: TransactionRequest) -> Result<TransactionRecord, AppError> {
        let validated = match validator::validate_all(&request, self.clock.today()) {
            Ok(validated) => validated,
            Err(errors) => {
                tracing::warn!(
                    card = %mask_card_number(&request.card_number),
                    errors = %errors,
                    "Transaction rejected by validation"
                );
                return Err(AppError::Validation(errors));
            }
        };

        let reference_id = self.references.next().await?;
        let mut record = TransactionRecord::new(reference_id, request);
        self.store.insert(&record).await?;

        record.begin_processing()?;
        self.store.update(&record).await?;

        let classification = match self.preflight.evaluate(&validated) {
            Some(denial) => {
                tracing::warn!(
                    reference = %record.reference_id(),
                    return_code = denial.return_code,
                    reason = %denial.message,
                    "Transaction denied by preflight rules"
                );
                classifier::classify_denial(&denial)
            }
            None => {
                let payload = GatewayRequest::from(&validated);
                let outcome = self.gateway.submit(&payload).await;
                classifier::classify(&outcome)
            }
        };

        record.finalize(classification)?;
        self.persist_outcome(&record).await;

        tracing::info!(
            reference = %record.reference_id(),
            status = %record.status(),
            return_code = ?record.return_code(),
            "Transaction completed"
        );

        Ok(record)
    }

    /// Store the terminal state of a record.
    ///
    /// If every attempt fails the stored copy stays `processing` while the
    /// gateway may have acted, so the full outcome is logged at error level.
    async fn persist_outcome(&self, record: &TransactionRecord) {
        for attempt in 1..=OUTCOME_WRITE_ATTEMPTS {
            match self.store.update(record).await {
                Ok(()) => return,
                Err(e) if attempt < OUTCOME_WRITE_ATTEMPTS => {
                    tracing::warn!(
                        reference = %record.reference_id(),
                        attempt,
                        error = %e,
                        "Failed to store transaction outcome, retrying"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        reference = %record.reference_id(),
                        status = %record.status(),
                        http_status = ?record.http_status(),
                        return_code = ?record.return_code(),
                        message = ?record.message(),
                        error = %e,
                        "Transaction outcome not stored; record needs reconciliation"
                    );
                }
            }
        }
    }

    /// Get a transaction by reference.
    pub async fn get(&self, reference_id: &str) -> Result<TransactionRecord, AppError> {
        self.store
            .get(reference_id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(reference_id.to_string()))
    }

    /// Full transaction history, newest first.
    pub async fn history(&self) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(self.store.list().await?)
    }

    /// Check the record store is reachable.
    pub async fn check_store(&self) -> Result<(), AppError> {
        Ok(self.store.ping().await?)
    }
}
