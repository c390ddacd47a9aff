//! Resource binding over a hosted document store.
//!
//! Resources map onto top-level collections, so nested resource names
//! such as `inventory/dashboard` are refused. Record ids come from the
//! request sub-path for reads and deletes, and from the body's `id` field
//! for writes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::domain::ports::{Document, DocumentStore, DocumentStoreError, ResourceBinding};
use crate::domain::{ApiRequest, FailedResponse, Method, RequestFailure, ResponseBody};

/// [`ResourceBinding`] that forwards the four verbs to a [`DocumentStore`].
#[derive(Clone)]
pub struct DocumentStoreBinding {
    store: Arc<dyn DocumentStore>,
}

impl DocumentStoreBinding {
    /// Bind over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for DocumentStoreBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreBinding").finish_non_exhaustive()
    }
}

#[async_trait]
impl ResourceBinding for DocumentStoreBinding {
    async fn send(&self, request: &ApiRequest) -> Result<Value, RequestFailure> {
        let collection = collection_name(request)?;
        debug!(method = %request.method(), path = %request.path(), "document store request");
        match request.method() {
            Method::Get => match request.sub_path() {
                None => {
                    let documents = self.store.list(collection).await.map_err(map_store_error)?;
                    Ok(Value::Array(
                        documents.into_iter().map(Document::into_record).collect(),
                    ))
                }
                Some(id) => {
                    let document = self
                        .store
                        .get(collection, id)
                        .await
                        .map_err(map_store_error)?;
                    Ok(document.into_record())
                }
            },
            Method::Post => {
                let (id, fields) = record_parts(request.body())?;
                self.store
                    .set(collection, &id, fields.clone())
                    .await
                    .map_err(map_store_error)?;
                Ok(Value::Object(fields))
            }
            Method::Put => {
                let (id, fields) = record_parts(request.body())?;
                self.store
                    .update(collection, &id, fields.clone())
                    .await
                    .map_err(map_store_error)?;
                Ok(Value::Object(fields))
            }
            Method::Delete => {
                let id = delete_id(request)?;
                self.store
                    .delete(collection, &id)
                    .await
                    .map_err(map_store_error)?;
                Ok(json!({"id": id, "deleted": true}))
            }
        }
    }
}

fn collection_name(request: &ApiRequest) -> Result<&str, RequestFailure> {
    let resource = request.resource();
    if resource.is_nested() {
        return Err(RequestFailure::exception(format!(
            "document store collections cannot be nested: `{resource}`"
        )));
    }
    Ok(resource.as_ref())
}

fn record_parts(body: Option<&Value>) -> Result<(String, Map<String, Value>), RequestFailure> {
    let Some(Value::Object(fields)) = body else {
        return Err(RequestFailure::exception(
            "document writes require a JSON object body",
        ));
    };
    let id = string_id(fields)
        .ok_or_else(|| RequestFailure::exception("document writes require a string `id` field"))?;
    Ok((id, fields.clone()))
}

fn delete_id(request: &ApiRequest) -> Result<String, RequestFailure> {
    if let Some(id) = request.sub_path() {
        return Ok(id.to_owned());
    }
    let id = match request.body() {
        Some(Value::Object(fields)) => string_id(fields),
        _ => None,
    };
    id.ok_or_else(|| RequestFailure::exception("document deletes require an id"))
}

fn string_id(fields: &Map<String, Value>) -> Option<String> {
    fields
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_owned)
}

fn failed(status: u16, reason: &str, error: &DocumentStoreError) -> RequestFailure {
    RequestFailure::from_response(FailedResponse::new(
        status,
        Some(reason.to_owned()),
        ResponseBody::Json(json!({"message": error.to_string()})),
    ))
}

fn map_store_error(error: DocumentStoreError) -> RequestFailure {
    match &error {
        DocumentStoreError::NotFound { .. } => failed(404, "Not Found", &error),
        DocumentStoreError::Unauthenticated { .. } => failed(401, "Unauthorized", &error),
        DocumentStoreError::PermissionDenied { .. } => failed(403, "Forbidden", &error),
        DocumentStoreError::Unavailable { message } => RequestFailure::network(message),
        DocumentStoreError::InvalidArgument { .. } | DocumentStoreError::Decode { .. } => {
            RequestFailure::exception(error.to_string())
        }
    }
}
