//! Reqwest-backed Firestore document store.
//!
//! This adapter owns transport details only: document URLs, the typed value
//! encoding, list pagination and HTTP error mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::codec::encode_fields;
use super::dto::{DocumentDto, ErrorEnvelopeDto, ListDocumentsDto, WriteDocumentDto};
use crate::domain::CredentialSlot;
use crate::domain::ports::{Document, DocumentStore, DocumentStoreError};

/// Database used when none is configured.
pub const DEFAULT_DATABASE_ID: &str = "(default)";
const LIST_PAGE_SIZE: u32 = 300;
const DEFAULT_USER_AGENT: &str = concat!("ledger-client-firestore/", env!("CARGO_PKG_VERSION"));

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreSettings {
    /// API root, normally `https://firestore.googleapis.com/`.
    pub endpoint: Url,
    /// Google Cloud project id.
    pub project_id: String,
    /// Database id within the project.
    pub database_id: String,
}

/// [`DocumentStore`] over the Firestore REST v1 API.
///
/// Requests carry the bearer credential from the shared slot, so the
/// session's identity-provider token authorises every call.
#[derive(Debug, Clone)]
pub struct FirestoreHttpStore {
    client: Client,
    settings: FirestoreSettings,
    credentials: CredentialSlot,
}

impl FirestoreHttpStore {
    /// Build a store client.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        settings: FirestoreSettings,
        credentials: CredentialSlot,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            settings,
            credentials,
        })
    }

    fn documents_url(&self, collection: &str, id: Option<&str>) -> Result<Url, DocumentStoreError> {
        let mut url = self.settings.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                DocumentStoreError::invalid_argument(format!(
                    "endpoint `{}` cannot carry a path",
                    self.settings.endpoint
                ))
            })?;
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                self.settings.project_id.as_str(),
                "databases",
                self.settings.database_id.as_str(),
                "documents",
                collection,
            ]);
            segments.extend(
                id.into_iter()
                    .flat_map(|id| id.split('/'))
                    .filter(|segment| !segment.is_empty()),
            );
        }
        Ok(url)
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        collection: &str,
        id: &str,
    ) -> Result<Vec<u8>, DocumentStoreError> {
        let mut builder = builder.header(header::ACCEPT, "application/json");
        if let Some(token) = self.credentials.current() {
            builder = builder.header(header::AUTHORIZATION, token.authorization_value());
        }
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref(), collection, id));
        }
        Ok(body.to_vec())
    }

    async fn write(
        &self,
        url: Url,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), DocumentStoreError> {
        let body = WriteDocumentDto {
            fields: encode_fields(fields),
        };
        self.send(self.client.patch(url).json(&body), collection, id)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreHttpStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, DocumentStoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.documents_url(collection, None)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &LIST_PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }
            let body = self.send(self.client.get(url), collection, "*").await?;
            let page: ListDocumentsDto = decode_json(&body)?;
            for document in page.documents {
                documents.push(document.into_document()?);
            }
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        debug!(collection, count = documents.len(), "listed Firestore documents");
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, DocumentStoreError> {
        let url = self.documents_url(collection, Some(id))?;
        let body = self.send(self.client.get(url), collection, id).await?;
        decode_json::<DocumentDto>(&body)?.into_document()
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), DocumentStoreError> {
        let url = self.documents_url(collection, Some(id))?;
        self.write(url, collection, id, &fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), DocumentStoreError> {
        if fields.is_empty() {
            // An empty mask would replace the whole document.
            return self.get(collection, id).await.map(|_| ());
        }
        let mut url = self.documents_url(collection, Some(id))?;
        {
            let mut query = url.query_pairs_mut();
            for key in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(key));
            }
            query.append_pair("currentDocument.exists", "true");
        }
        self.write(url, collection, id, &fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentStoreError> {
        let url = self.documents_url(collection, Some(id))?;
        match self.send(self.client.delete(url), collection, id).await {
            Ok(_) | Err(DocumentStoreError::NotFound { .. }) => Ok(()),
            Err(error) => Err(error),
        }
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, DocumentStoreError> {
    serde_json::from_slice(body).map_err(|error| {
        DocumentStoreError::decode(format!("invalid Firestore JSON payload: {error}"))
    })
}

/// Quote keys that are not simple identifiers, per Firestore field-path rules.
fn field_path(key: &str) -> String {
    let mut chars = key.chars();
    let simple = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_owned()
    } else {
        format!("`{}`", key.replace('\\', r"\\").replace('`', r"\`"))
    }
}

fn map_transport_error(error: reqwest::Error) -> DocumentStoreError {
    DocumentStoreError::unavailable(error.to_string())
}

fn map_status_error(
    status: StatusCode,
    body: &[u8],
    collection: &str,
    id: &str,
) -> DocumentStoreError {
    let detail = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .and_then(|envelope| envelope.describe())
        .unwrap_or_else(|| body_preview(body));
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {detail}", status.as_u16())
    };

    match status {
        StatusCode::NOT_FOUND => DocumentStoreError::not_found(collection, id),
        StatusCode::UNAUTHORIZED => DocumentStoreError::unauthenticated(message),
        StatusCode::FORBIDDEN => DocumentStoreError::permission_denied(message),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            DocumentStoreError::unavailable(message)
        }
        _ if status.is_server_error() => DocumentStoreError::unavailable(message),
        _ => DocumentStoreError::invalid_argument(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network Firestore helpers.

    use super::*;
    use rstest::rstest;

    fn store() -> FirestoreHttpStore {
        let settings = FirestoreSettings {
            endpoint: Url::parse("https://firestore.googleapis.com/").expect("endpoint"),
            project_id: "ledger-demo".to_owned(),
            database_id: DEFAULT_DATABASE_ID.to_owned(),
        };
        FirestoreHttpStore::new(settings, CredentialSlot::new(), None).expect("client builds")
    }

    #[test]
    fn builds_document_urls() {
        let url = store()
            .documents_url("contacts", Some("C 1"))
            .expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/ledger-demo/databases/(default)/documents/contacts/C%201"
        );
    }

    #[rstest]
    #[case("total", "total")]
    #[case("_draft2", "_draft2")]
    #[case("line items", "`line items`")]
    #[case("2fa", "`2fa`")]
    #[case("a`b", r"`a\`b`")]
    fn quotes_non_identifier_field_paths(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(field_path(key), expected);
    }

    #[rstest]
    #[case::not_found(StatusCode::NOT_FOUND, "NotFound")]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, "Unauthenticated")]
    #[case::forbidden(StatusCode::FORBIDDEN, "PermissionDenied")]
    #[case::throttled(StatusCode::TOO_MANY_REQUESTS, "Unavailable")]
    #[case::server_error(StatusCode::SERVICE_UNAVAILABLE, "Unavailable")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "InvalidArgument")]
    fn maps_http_statuses_to_store_errors(#[case] status: StatusCode, #[case] expected: &str) {
        let body = br#"{"error":{"code":0,"message":"rejected","status":"SOME_STATUS"}}"#;
        let error = map_status_error(status, body, "contacts", "C-1");
        let matched = match expected {
            "NotFound" => matches!(error, DocumentStoreError::NotFound { .. }),
            "Unauthenticated" => matches!(error, DocumentStoreError::Unauthenticated { .. }),
            "PermissionDenied" => matches!(error, DocumentStoreError::PermissionDenied { .. }),
            "Unavailable" => matches!(error, DocumentStoreError::Unavailable { .. }),
            "InvalidArgument" => matches!(error, DocumentStoreError::InvalidArgument { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} mapped to {error:?}");
    }

    #[test]
    fn status_errors_prefer_the_error_envelope() {
        let body = br#"{"error":{"message":"Missing or insufficient permissions.","status":"PERMISSION_DENIED"}}"#;
        let error = map_status_error(StatusCode::FORBIDDEN, body, "contacts", "C-1");
        assert_eq!(
            error.to_string(),
            "document store denied access: status 403: PERMISSION_DENIED: Missing or insufficient permissions."
        );
    }

    #[test]
    fn body_preview_truncates_long_bodies() {
        let body = "x".repeat(200);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }
}
