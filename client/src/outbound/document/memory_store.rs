//! Process-local document store for tests and offline sessions.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::ports::{Document, DocumentStore, DocumentStoreError};

type Collections = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

/// In-memory [`DocumentStore`] keyed by collection then document id.
///
/// Listing returns documents in id order. Absent collections list as empty.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<Collections>,
}

impl InMemoryDocumentStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `documents` in `collection`.
    pub fn with_documents(
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        let store = Self::new();
        {
            let mut collections = store.lock();
            let entries = collections.entry(collection.to_owned()).or_default();
            for document in documents {
                entries.insert(document.id, document.fields);
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentStoreError> {
        Ok(self
            .lock()
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, DocumentStoreError> {
        self.lock()
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone()))
            .ok_or_else(|| DocumentStoreError::not_found(collection, id))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), DocumentStoreError> {
        self.lock()
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), fields);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), DocumentStoreError> {
        let mut collections = self.lock();
        let existing = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| DocumentStoreError::not_found(collection, id))?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentStoreError> {
        if let Some(documents) = self.lock().get_mut(collection) {
            documents.remove(id);
        }
        Ok(())
    }
}
