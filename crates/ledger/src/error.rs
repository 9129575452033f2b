//! Ledger error model.

use thiserror::Error;

use tindahan_core::DomainError;
use tindahan_store::StoreError;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger operation error.
///
/// Every failure leaves the store untouched: validation and invariant
/// failures happen before any write is staged, and store conflicts abort
/// whole batches.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Deterministic domain failure (validation, invariant, missing order).
    /// Not retryable.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Store-level failure. Conflicts abort without partial writes.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// True when the operation lost an optimistic race and can be re-invoked
    /// as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Store(StoreError::Conflict(_)))
    }
}
