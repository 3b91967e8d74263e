//! Reference id generation.
//!
//! References are handed out once and never reused, even when the
//! transaction they were issued for fails.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::store::StoreError;

pub const DEFAULT_PREFIX: &str = "TRX";

/// Source of unique, monotonically increasing transaction references.
#[async_trait]
pub trait ReferenceGenerator: Send + Sync {
    async fn next(&self) -> Result<String, StoreError>;
}

/// Format a sequence number as a reference, e.g. `TRX/000042`.
pub fn format_reference(prefix: &str, sequence: u64) -> String {
    format!("{prefix}/{sequence:06}")
}

/// Sequence number of a reference, e.g. 42 for `TRX/000042`.
pub fn reference_sequence(reference: &str) -> Option<u64> {
    reference.rsplit_once('/')?.1.parse().ok()
}

/// In-process generator backed by an atomic counter.
#[derive(Debug)]
pub struct SequentialReferenceGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialReferenceGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    /// Resume numbering at `first`, e.g. after a restart.
    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialReferenceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

#[async_trait]
impl ReferenceGenerator for SequentialReferenceGenerator {
    async fn next(&self) -> Result<String, StoreError> {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(format_reference(&self.prefix, sequence))
    }
}
