use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use crate::document::{DocKey, Document, WriteBatch, WriteOp};
use crate::r#trait::{DocumentStore, StoreError};

#[derive(Debug, Clone)]
struct StoredDoc {
    version: u64,
    data: JsonValue,
}

/// In-memory transactional document store.
///
/// Intended for tests/dev. `commit` validates the whole batch under one
/// write lock before applying anything, so a batch lands in full or not at
/// all and conflicting commits are serialized.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<HashMap<DocKey, StoredDoc>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents (test/dev helper).
    pub fn len(&self) -> usize {
        self.docs.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, key: &DocKey) -> Result<Option<Document>, StoreError> {
        let docs = self
            .docs
            .read()
            .map_err(|_| StoreError::InvalidWrite("lock poisoned".to_string()))?;

        Ok(docs.get(key).map(|d| Document {
            key: *key,
            version: d.version,
            data: d.data.clone(),
        }))
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| StoreError::InvalidWrite("lock poisoned".to_string()))?;

        // A batch may touch each document at most once.
        let mut seen = HashSet::new();
        for write in batch.writes() {
            if !seen.insert(write.key) {
                return Err(StoreError::InvalidWrite(format!(
                    "duplicate write for {}",
                    write.key
                )));
            }
        }

        // Validate every guard and precondition before applying anything.
        for (key, observed) in batch.guards() {
            let current = docs.get(key).map_or(0, |d| d.version);
            if current != *observed {
                return Err(StoreError::Conflict(format!(
                    "guard on {key}: observed version {observed}, found {current}"
                )));
            }
        }
        for write in batch.writes() {
            let current = docs.get(&write.key).map(|d| d.version);
            match &write.op {
                WriteOp::Create(_) => {
                    if current.is_some() {
                        return Err(StoreError::AlreadyExists(write.key.to_string()));
                    }
                }
                WriteOp::Update { expected, .. } | WriteOp::Delete { expected } => {
                    let Some(version) = current else {
                        return Err(StoreError::Conflict(format!(
                            "{} no longer exists",
                            write.key
                        )));
                    };
                    if !expected.matches(version) {
                        return Err(StoreError::Conflict(format!(
                            "{}: expected {expected:?}, found version {version}",
                            write.key
                        )));
                    }
                }
            }
        }

        // Apply; infallible past this point.
        for write in batch.into_writes() {
            match write.op {
                WriteOp::Create(data) => {
                    docs.insert(write.key, StoredDoc { version: 1, data });
                }
                WriteOp::Update { data, .. } => {
                    if let Some(doc) = docs.get_mut(&write.key) {
                        doc.version += 1;
                        doc.data = data;
                    }
                }
                WriteOp::Delete { .. } => {
                    docs.remove(&write.key);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ExpectedVersion;
    use serde_json::json;
    use uuid::Uuid;

    fn key() -> DocKey {
        DocKey::new("things", Uuid::now_v7())
    }

    #[test]
    fn create_then_get_roundtrips_with_version_one() {
        let store = InMemoryDocumentStore::new();
        let key = key();

        let mut batch = WriteBatch::new();
        batch.create(key, json!({"n": 1}));
        store.commit(batch).unwrap();

        let doc = store.get(&key).unwrap().unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.data, json!({"n": 1}));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_on_existing_document_aborts() {
        let store = InMemoryDocumentStore::new();
        let key = key();

        let mut batch = WriteBatch::new();
        batch.create(key, json!({}));
        store.commit(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.create(key, json!({}));
        let err = store.commit(batch).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn version_mismatch_aborts_the_whole_batch() {
        let store = InMemoryDocumentStore::new();
        let a = key();
        let b = key();

        let mut batch = WriteBatch::new();
        batch.create(a, json!({"n": 1}));
        batch.create(b, json!({"n": 1}));
        store.commit(batch).unwrap();

        // Second write carries a stale expectation; the first must not land.
        let mut batch = WriteBatch::new();
        batch.update(a, json!({"n": 2}), ExpectedVersion::Exact(1));
        batch.update(b, json!({"n": 2}), ExpectedVersion::Exact(7));
        let err = store.commit(batch).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let doc = store.get(&a).unwrap().unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.data, json!({"n": 1}));
    }

    #[test]
    fn absence_guard_fires_when_document_appears() {
        let store = InMemoryDocumentStore::new();
        let a = key();
        let b = key();

        let mut batch = WriteBatch::new();
        batch.create(a, json!({}));
        store.commit(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.guard(a, 0); // claims `a` was absent
        batch.create(b, json!({}));
        let err = store.commit(batch).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.get(&b).unwrap().is_none());
    }

    #[test]
    fn duplicate_writes_in_one_batch_are_rejected() {
        let store = InMemoryDocumentStore::new();
        let key = key();

        let mut batch = WriteBatch::new();
        batch.create(key, json!({"n": 1}));
        batch.update(key, json!({"n": 2}), ExpectedVersion::Any);
        let err = store.commit(batch).unwrap_err();
        assert!(matches!(err, StoreError::InvalidWrite(_)));
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn delete_removes_the_document() {
        let store = InMemoryDocumentStore::new();
        let key = key();

        let mut batch = WriteBatch::new();
        batch.create(key, json!({}));
        store.commit(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(key, ExpectedVersion::Exact(1));
        store.commit(batch).unwrap();

        assert!(store.get(&key).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn blind_update_on_missing_document_conflicts() {
        let store = InMemoryDocumentStore::new();

        let mut batch = WriteBatch::new();
        batch.update(key(), json!({}), ExpectedVersion::Any);
        let err = store.commit(batch).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
