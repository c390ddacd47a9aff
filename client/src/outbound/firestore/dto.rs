//! DTOs for Firestore REST v1 payloads.
//!
//! Responses decode into these transport DTOs first, then map into domain
//! documents through the value codec.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::codec::decode_fields;
use crate::domain::ports::{Document, DocumentStoreError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ListDocumentsDto {
    #[serde(default)]
    pub(super) documents: Vec<DocumentDto>,
    pub(super) next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DocumentDto {
    pub(super) name: String,
    #[serde(default)]
    pub(super) fields: Map<String, Value>,
}

impl DocumentDto {
    /// The id is the last segment of the resource name.
    pub(super) fn into_document(self) -> Result<Document, DocumentStoreError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                DocumentStoreError::decode(format!("document name `{}` has no id", self.name))
            })?
            .to_owned();
        Ok(Document::new(id, decode_fields(&self.fields)?))
    }
}

#[derive(Debug, Serialize)]
pub(super) struct WriteDocumentDto {
    pub(super) fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDto {
    #[serde(default)]
    pub(super) message: String,
    #[serde(default)]
    pub(super) status: String,
}

impl ErrorEnvelopeDto {
    /// `STATUS: message`, or whichever half is present.
    pub(super) fn describe(&self) -> Option<String> {
        let ErrorDto { message, status } = &self.error;
        match (status.is_empty(), message.is_empty()) {
            (true, true) => None,
            (true, false) => Some(message.clone()),
            (false, true) => Some(status.clone()),
            (false, false) => Some(format!("{status}: {message}")),
        }
    }
}
