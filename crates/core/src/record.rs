//! Persisted-record trait: how typed domain records map onto document
//! store addressing.

use uuid::Uuid;

/// A domain record persisted as a single document in a named collection.
///
/// Implementors are plain serde records; the store layer only needs the
/// collection name and the document id to address them, never their shape.
pub trait Record {
    /// Collection the record's documents live in.
    const COLLECTION: &'static str;

    /// Document id within the collection.
    fn record_id(&self) -> Uuid;
}
