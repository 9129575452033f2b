//! Documents, write batches and optimistic preconditions.

use serde_json::Value as JsonValue;
use uuid::Uuid;

use tindahan_core::Record;

/// Address of one document: a collection name plus a document id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub collection: &'static str,
    pub id: Uuid,
}

impl DocKey {
    pub fn new(collection: &'static str, id: Uuid) -> Self {
        Self { collection, id }
    }

    /// Key of a typed record's document.
    pub fn of<R: Record>(id: Uuid) -> Self {
        Self::new(R::COLLECTION, id)
    }
}

impl core::fmt::Display for DocKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A stored document: a versioned JSON payload.
///
/// Versions start at 1 on create and increase by 1 per committed write.
/// Read guards use version 0 to assert absence.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: DocKey,
    pub version: u64,
    pub data: JsonValue,
}

/// Optimistic concurrency expectation for a single write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (blind write).
    Any,
    /// Require the document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create a document that must not exist yet.
    Create(JsonValue),
    /// Replace a document's payload.
    Update {
        data: JsonValue,
        expected: ExpectedVersion,
    },
    /// Remove a document.
    Delete { expected: ExpectedVersion },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub key: DocKey,
    pub op: WriteOp,
}

/// An atomic multi-document mutation: ordered writes plus read guards.
///
/// Guards pin the version a transaction observed for documents it read but
/// does not write (version 0 asserts the document was absent). The store
/// validates every guard and every write precondition before applying
/// anything, so a batch lands in full or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
    guards: Vec<(DocKey, u64)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, key: DocKey, data: JsonValue) {
        self.writes.push(Write {
            key,
            op: WriteOp::Create(data),
        });
    }

    pub fn update(&mut self, key: DocKey, data: JsonValue, expected: ExpectedVersion) {
        self.writes.push(Write {
            key,
            op: WriteOp::Update { data, expected },
        });
    }

    pub fn delete(&mut self, key: DocKey, expected: ExpectedVersion) {
        self.writes.push(Write {
            key,
            op: WriteOp::Delete { expected },
        });
    }

    pub fn guard(&mut self, key: DocKey, observed_version: u64) {
        self.guards.push((key, observed_version));
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn touches(&self, key: &DocKey) -> bool {
        self.writes.iter().any(|w| w.key == *key)
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn guards(&self) -> &[(DocKey, u64)] {
        &self.guards
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}
