//! Transaction record storage.
//!
//! The core never talks to a database directly; it is handed a
//! [`TransactionStore`] and a [`ReferenceGenerator`]. Two implementations
//! ship here:
//!
//! - `InMemoryTransactionStore`: `RwLock<HashMap>`, for tests and local runs
//! - `PgTransactionStore`: PostgreSQL via sqlx, table `card_transactions`
//!
//! Both refuse to update a record that already reached a terminal status,
//! so a stored outcome cannot be overwritten.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::db::DbPool;
use crate::models::transaction::{
    TransactionRecord, TransactionRequest, TransactionStatus, TransactionType,
};
use crate::services::reference::{
    DEFAULT_PREFIX, ReferenceGenerator, format_reference, reference_sequence,
};

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transaction {0} already exists")]
    Duplicate(String),

    /// Record missing, or already terminal and therefore immutable
    #[error("Transaction {0} cannot be updated")]
    NotUpdatable(String),

    #[error("Corrupt transaction row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError>;
    async fn update(&self, record: &TransactionRecord) -> Result<(), StoreError>;
    async fn get(&self, reference_id: &str) -> Result<Option<TransactionRecord>, StoreError>;

    /// Full history, newest first.
    async fn list(&self) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Connectivity check for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// A thread-safe in-memory record store.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    records: Arc<RwLock<HashMap<String, TransactionRecord>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let reference_id = record.reference_id().to_string();
        if records.contains_key(&reference_id) {
            return Err(StoreError::Duplicate(reference_id));
        }
        records.insert(reference_id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(record.reference_id()) {
            Some(existing) if !existing.status().is_terminal() => {
                *existing = record.clone();
                Ok(())
            }
            _ => Err(StoreError::NotUpdatable(record.reference_id().to_string())),
        }
    }

    async fn get(&self, reference_id: &str) -> Result<Option<TransactionRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(reference_id).cloned())
    }

    async fn list(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        let records = self.records.read().await;
        let mut all: Vec<TransactionRecord> = records.values().cloned().collect();
        // Same-instant ties fall back to issue order; references outgrow
        // their zero padding, so compare the numbers.
        all.sort_by(|a, b| {
            b.created_at().cmp(&a.created_at()).then_with(|| {
                reference_sequence(b.reference_id())
                    .cmp(&reference_sequence(a.reference_id()))
                    .then_with(|| b.reference_id().cmp(a.reference_id()))
            })
        });
        Ok(all)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Row shape of the `card_transactions` table.
#[derive(Debug, sqlx::FromRow)]
struct CardTransactionRow {
    reference_id: String,
    terminal_number: String,
    terminal_password: String,
    card_number: String,
    expiry_date: String,
    cvv: String,
    cardholder_name: String,
    amount: Decimal,
    transaction_type: String,
    status: String,
    raw_response: Option<String>,
    http_status: Option<i32>,
    return_code: Option<i64>,
    message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CardTransactionRow> for TransactionRecord {
    type Error = StoreError;

    fn try_from(row: CardTransactionRow) -> Result<Self, Self::Error> {
        let transaction_type: TransactionType =
            row.transaction_type.parse().map_err(StoreError::Corrupt)?;
        let status: TransactionStatus = row.status.parse().map_err(StoreError::Corrupt)?;
        let http_status = row
            .http_status
            .map(u16::try_from)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("http_status: {e}")))?;

        Ok(TransactionRecord::restore(
            row.reference_id,
            TransactionRequest {
                terminal_number: row.terminal_number,
                terminal_password: row.terminal_password,
                card_number: row.card_number,
                expiry_date: row.expiry_date,
                cvv: row.cvv,
                cardholder_name: row.cardholder_name,
                amount: row.amount,
                transaction_type,
            },
            status,
            row.raw_response,
            http_status,
            row.return_code,
            row.message,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct PgTransactionStore {
    pool: DbPool,
}

impl PgTransactionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let request = record.request();
        let result = sqlx::query(
            r#"
            INSERT INTO card_transactions (
                reference_id,
                terminal_number,
                terminal_password,
                card_number,
                expiry_date,
                cvv,
                cardholder_name,
                amount,
                transaction_type,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (reference_id) DO NOTHING
            "#,
        )
        .bind(record.reference_id())
        .bind(&request.terminal_number)
        .bind(&request.terminal_password)
        .bind(&request.card_number)
        .bind(&request.expiry_date)
        .bind(&request.cvv)
        .bind(&request.cardholder_name)
        .bind(request.amount)
        .bind(request.transaction_type.as_str())
        .bind(record.status().as_str())
        .bind(record.created_at())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate(record.reference_id().to_string()));
        }

        Ok(())
    }

    async fn update(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        // Terminal rows are immutable
        let result = sqlx::query(
            r#"
            UPDATE card_transactions
            SET status = $2,
                raw_response = $3,
                http_status = $4,
                return_code = $5,
                message = $6,
                updated_at = $7
            WHERE reference_id = $1
              AND status NOT IN ('success', 'failed', 'pending')
            "#,
        )
        .bind(record.reference_id())
        .bind(record.status().as_str())
        .bind(record.raw_response())
        .bind(record.http_status().map(i32::from))
        .bind(record.return_code())
        .bind(record.message())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotUpdatable(record.reference_id().to_string()));
        }

        Ok(())
    }

    async fn get(&self, reference_id: &str) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query_as::<_, CardTransactionRow>(
            "SELECT * FROM card_transactions WHERE reference_id = $1",
        )
        .bind(reference_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRecord::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, CardTransactionRow>(
            r#"
            SELECT * FROM card_transactions
            ORDER BY created_at DESC, length(reference_id) DESC, reference_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// References drawn from the `card_transaction_reference_seq` sequence, so
/// numbering survives restarts and is shared between instances.
#[derive(Clone)]
pub struct PgReferenceGenerator {
    pool: DbPool,
    prefix: String,
}

impl PgReferenceGenerator {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

#[async_trait]
impl ReferenceGenerator for PgReferenceGenerator {
    async fn next(&self) -> Result<String, StoreError> {
        let sequence: i64 = sqlx::query_scalar("SELECT nextval('card_transaction_reference_seq')")
            .fetch_one(&self.pool)
            .await?;

        let sequence = u64::try_from(sequence)
            .map_err(|e| StoreError::Corrupt(format!("reference sequence: {e}")))?;
        Ok(format_reference(&self.prefix, sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::tests::sample_request;
    use crate::services::classifier::Classification;

    fn record(reference_id: &str) -> TransactionRecord {
        TransactionRecord::new(reference_id.to_string(), sample_request())
    }

    fn failed() -> Classification {
        Classification {
            status: TransactionStatus::Failed,
            http_status: Some(200),
            return_code: Some(-1),
            message: "declined".to_string(),
            raw_response: r#"{"HasError":false,"ReturnCode":-1}"#.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryTransactionStore::new();
        store.insert(&record("TRX/000001")).await.unwrap();

        let loaded = store.get("TRX/000001").await.unwrap().unwrap();
        assert_eq!(loaded.status(), TransactionStatus::Draft);
        assert!(store.get("TRX/999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryTransactionStore::new();
        store.insert(&record("TRX/000001")).await.unwrap();
        let err = store.insert(&record("TRX/000001")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_terminal_records_are_immutable() {
        let store = InMemoryTransactionStore::new();
        let mut rec = record("TRX/000001");
        store.insert(&rec).await.unwrap();

        rec.begin_processing().unwrap();
        store.update(&rec).await.unwrap();
        rec.finalize(failed()).unwrap();
        store.update(&rec).await.unwrap();

        let err = store.update(&rec).await.unwrap_err();
        assert!(matches!(err, StoreError::NotUpdatable(_)));

        let stored = store.get("TRX/000001").await.unwrap().unwrap();
        assert_eq!(stored.status(), TransactionStatus::Failed);
        assert_eq!(stored.return_code(), Some(-1));
    }

    #[tokio::test]
    async fn test_update_unknown_record() {
        let store = InMemoryTransactionStore::new();
        let err = store.update(&record("TRX/000404")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotUpdatable(_)));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryTransactionStore::new();
        for id in ["TRX/000001", "TRX/000002", "TRX/000003"] {
            store.insert(&record(id)).await.unwrap();
        }

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.reference_id().to_string())
            .collect();
        assert_eq!(ids, vec!["TRX/000003", "TRX/000002", "TRX/000001"]);
    }

    #[tokio::test]
    async fn test_list_orders_past_padding_width() {
        let store = InMemoryTransactionStore::new();
        let now = Utc::now();
        for id in ["TRX/999999", "TRX/1000000"] {
            let rec = TransactionRecord::restore(
                id.to_string(),
                sample_request(),
                TransactionStatus::Draft,
                None,
                None,
                None,
                None,
                now,
                now,
            );
            store.insert(&rec).await.unwrap();
        }

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.reference_id().to_string())
            .collect();
        assert_eq!(ids, vec!["TRX/1000000", "TRX/999999"]);
    }

    #[test]
    fn test_row_conversion_rejects_unknown_status() {
        let now = Utc::now();
        let row = CardTransactionRow {
            reference_id: "TRX/000001".to_string(),
            terminal_number: "0882016016".to_string(),
            terminal_password: "Z0882016016".to_string(),
            card_number: "375510390507767".to_string(),
            expiry_date: "12/25".to_string(),
            cvv: "488".to_string(),
            cardholder_name: "Test User".to_string(),
            amount: Decimal::ONE_HUNDRED,
            transaction_type: "sale".to_string(),
            status: "archived".to_string(),
            raw_response: None,
            http_status: None,
            return_code: None,
            message: None,
            created_at: now,
            updated_at: now,
        };

        let err = TransactionRecord::try_from(row).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
