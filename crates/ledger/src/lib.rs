//! `tindahan-ledger` — order/inventory consistency services over the
//! document store.
//!
//! The [`InventoryLedger`] owns the rule that every unit of stock sold is
//! reserved at order-creation time and restored at cancellation-approval
//! time, expressed as atomic transactions against an injected
//! [`tindahan_store::DocumentStore`]. The sibling services cover the other
//! storefront writes that must hold product invariants: review posting and
//! seller catalog maintenance.

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod reviews;

pub use catalog::CatalogService;
pub use error::{LedgerError, LedgerResult};
pub use ledger::InventoryLedger;
pub use reviews::ReviewService;
