use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use tindahan_core::Record;

use crate::document::{DocKey, Document, ExpectedVersion, WriteBatch};
use crate::r#trait::{DocumentStore, StoreError};

/// Optimistic read-then-write transaction over a [`DocumentStore`].
///
/// Reads record the observed version of every document (including absence);
/// writes are staged locally. `commit` submits one batch whose preconditions
/// reproduce the observed versions, so a concurrent change to anything this
/// transaction read aborts the whole commit with [`StoreError::Conflict`]
/// and nothing is applied.
///
/// The store contract requires all reads to precede all writes; a read after
/// the first staged write is an [`StoreError::InvalidWrite`].
pub struct Transaction<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    observed: HashMap<DocKey, u64>,
    batch: WriteBatch,
}

impl<'a, S: DocumentStore + ?Sized> Transaction<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            observed: HashMap::new(),
            batch: WriteBatch::new(),
        }
    }

    /// Read one document, recording its version in the read set.
    pub fn get(&mut self, key: DocKey) -> Result<Option<Document>, StoreError> {
        if !self.batch.is_empty() {
            return Err(StoreError::InvalidWrite(
                "transaction reads must precede writes".to_string(),
            ));
        }
        let doc = self.store.get(&key)?;
        self.observed.insert(key, doc.as_ref().map_or(0, |d| d.version));
        Ok(doc)
    }

    /// Read and decode one typed record.
    pub fn get_record<R>(&mut self, id: Uuid) -> Result<Option<R>, StoreError>
    where
        R: Record + DeserializeOwned,
    {
        let Some(doc) = self.get(DocKey::of::<R>(id))? else {
            return Ok(None);
        };
        let record = serde_json::from_value(doc.data)
            .map_err(|e| StoreError::Serialization(format!("{}/{id}: {e}", R::COLLECTION)))?;
        Ok(Some(record))
    }

    /// Stage the creation of a record whose document must not exist yet.
    pub fn create<R>(&mut self, record: &R) -> Result<(), StoreError>
    where
        R: Record + Serialize,
    {
        let key = DocKey::of::<R>(record.record_id());
        self.batch.create(key, encode(record)?);
        Ok(())
    }

    /// Stage a replacement of a record's document.
    ///
    /// When the document was read in this transaction, the observed version
    /// becomes the write's precondition; an unread document gets a blind
    /// write.
    pub fn update<R>(&mut self, record: &R) -> Result<(), StoreError>
    where
        R: Record + Serialize,
    {
        let key = DocKey::of::<R>(record.record_id());
        let expected = self.expectation(&key)?;
        self.batch.update(key, encode(record)?, expected);
        Ok(())
    }

    /// Stage the removal of a document.
    pub fn delete(&mut self, key: DocKey) -> Result<(), StoreError> {
        let expected = self.expectation(&key)?;
        self.batch.delete(key, expected);
        Ok(())
    }

    fn expectation(&self, key: &DocKey) -> Result<ExpectedVersion, StoreError> {
        match self.observed.get(key) {
            Some(&0) => Err(StoreError::InvalidWrite(format!(
                "cannot mutate {key}: observed as absent in this transaction"
            ))),
            Some(&version) => Ok(ExpectedVersion::Exact(version)),
            None => Ok(ExpectedVersion::Any),
        }
    }

    /// Submit all staged writes as one atomic batch, guarding every
    /// read-only document at its observed version.
    pub fn commit(self) -> Result<(), StoreError> {
        let mut batch = self.batch;
        for (key, version) in &self.observed {
            if !batch.touches(key) {
                batch.guard(*key, *version);
            }
        }
        self.store.commit(batch)
    }
}

fn encode<R: Serialize>(record: &R) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(record)
        .map_err(|e| StoreError::Serialization(format!("payload serialization failed: {e}")))
}
