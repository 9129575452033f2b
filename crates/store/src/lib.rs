//! `tindahan-store` — transactional key-value document store contract.
//!
//! The hosted document backend is external to this workspace; this crate
//! defines the contract the ledger writes against (get-by-id, atomic
//! multi-document batches, optimistic read-then-write transactions) plus an
//! in-memory implementation for tests and development.

pub mod document;
pub mod in_memory;
pub mod r#trait;
pub mod transaction;

pub use document::{DocKey, Document, ExpectedVersion, Write, WriteBatch, WriteOp};
pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{DocumentStore, StoreError};
pub use transaction::Transaction;
