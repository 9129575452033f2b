use std::sync::Arc;

use thiserror::Error;

use crate::document::{DocKey, Document, WriteBatch};

/// Document store operation error.
///
/// These are storage failures (conflicts, malformed batches) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// An optimistic precondition or read guard did not hold. The whole
    /// batch was aborted and nothing was written; retrying is safe.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// A `Create` targeted a document that already exists.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// The batch itself was malformed (duplicate keys, late reads, poisoned
    /// lock).
    #[error("invalid write: {0}")]
    InvalidWrite(String),

    /// A payload could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Transactional key-value document store.
///
/// ## Contract
///
/// - `get` returns the current version of a document, if present.
/// - `commit` applies a batch atomically: every read guard and per-write
///   precondition is validated before any write lands, and any mismatch
///   aborts the whole batch with [`StoreError::Conflict`]. A batch may touch
///   each document at most once.
///
/// Implementations must serialize conflicting commits so that two batches
/// guarding the same document version cannot both succeed.
pub trait DocumentStore: Send + Sync {
    fn get(&self, key: &DocKey) -> Result<Option<Document>, StoreError>;

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn get(&self, key: &DocKey) -> Result<Option<Document>, StoreError> {
        (**self).get(key)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).commit(batch)
    }
}
