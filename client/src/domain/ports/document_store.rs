//! Driven port for a hosted document store (collections of JSON documents
//! addressed by id).

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::define_port_error;

/// One stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id within its collection.
    pub id: String,
    /// Document fields.
    pub fields: Map<String, Value>,
}

impl Document {
    /// Build a document from its id and fields.
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Record shape seen by callers: the fields plus `id`.
    ///
    /// The stored id wins over any `id` field inside the document.
    pub fn into_record(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_owned(), Value::String(self.id));
        Value::Object(fields)
    }
}

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// The document or collection does not exist.
        NotFound { collection: String, id: String } =>
            "document {collection}/{id} not found",
        /// The caller is not signed in or the credential expired.
        Unauthenticated { message: String } =>
            "document store rejected the credential: {message}",
        /// The caller is signed in but may not touch this document.
        PermissionDenied { message: String } =>
            "document store denied access: {message}",
        /// The store could not be reached.
        Unavailable { message: String } =>
            "document store unavailable: {message}",
        /// The request was malformed.
        InvalidArgument { message: String } =>
            "document store rejected the request: {message}",
        /// The store answered with data the adapter could not decode.
        Decode { message: String } =>
            "document store response decode failed: {message}",
    }
}

/// Port for document-store primitives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection`.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentStoreError>;

    /// The document `id` in `collection`.
    async fn get(&self, collection: &str, id: &str) -> Result<Document, DocumentStoreError>;

    /// Create or overwrite a document.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), DocumentStoreError>;

    /// Merge `fields` into an existing document.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), DocumentStoreError>;

    /// Delete a document. Deleting an absent document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentStoreError>;
}
