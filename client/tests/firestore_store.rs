//! Firestore adapter behaviour against a stub REST API.

mod support;

use ledger_client::config::ClientSettings;
use ledger_client::domain::ports::{Document, DocumentStore, DocumentStoreError};
use ledger_client::domain::{BearerToken, CredentialSlot, FailureKind};
use ledger_client::outbound::firestore::{FirestoreHttpStore, FirestoreSettings};
use rstest::{fixture, rstest};
use serde_json::{Map, Value, json};
use support::{Harness, ada_token};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENTS: &str = "/v1/projects/ledger-demo/databases/(default)/documents";

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn store(server: &MockServer, credentials: CredentialSlot) -> FirestoreHttpStore {
    let settings = FirestoreSettings {
        endpoint: Url::parse(&server.uri()).expect("server url"),
        project_id: "ledger-demo".to_owned(),
        database_id: "(default)".to_owned(),
    };
    FirestoreHttpStore::new(settings, credentials, None).expect("store builds")
}

#[fixture]
fn credentials() -> CredentialSlot {
    let slot = CredentialSlot::new();
    slot.attach(BearerToken::new("id-token").expect("token"));
    slot
}

#[rstest]
#[tokio::test]
async fn lists_follow_page_tokens(credentials: CredentialSlot) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/contacts")))
        .and(query_param("pageSize", "300"))
        .and(query_param_is_missing("pageToken"))
        .and(header("authorization", "Bearer id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "name": "projects/ledger-demo/databases/(default)/documents/contacts/C-1",
                "fields": {"name": {"stringValue": "Acme"}},
            }],
            "nextPageToken": "page-2",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/contacts")))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "name": "projects/ledger-demo/databases/(default)/documents/contacts/C-2",
                "fields": {"balance": {"integerValue": "250"}},
            }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let documents = store(&server, credentials)
        .list("contacts")
        .await
        .expect("list succeeds");

    assert_eq!(
        documents,
        vec![
            Document::new("C-1", fields(json!({"name": "Acme"}))),
            Document::new("C-2", fields(json!({"balance": 250}))),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn updates_send_a_field_mask(credentials: CredentialSlot) {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/items/I-1")))
        .and(query_param("updateMask.fieldPaths", "price"))
        .and(query_param("updateMask.fieldPaths", "`unit-name`"))
        .and(query_param("currentDocument.exists", "true"))
        .and(body_json(json!({
            "fields": {
                "price": {"doubleValue": 9.5},
                "unit-name": {"stringValue": "box"},
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/ledger-demo/databases/(default)/documents/items/I-1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    store(&server, credentials)
        .update(
            "items",
            "I-1",
            fields(json!({"price": 9.5, "unit-name": "box"})),
        )
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn missing_documents_map_to_not_found(credentials: CredentialSlot) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/items/gone")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"},
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DOCUMENTS}/items/gone")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store(&server, credentials);
    let error = store.get("items", "gone").await.expect_err("missing");
    assert!(matches!(error, DocumentStoreError::NotFound { .. }));
    store
        .delete("items", "gone")
        .await
        .expect("deleting a missing document succeeds");
}

#[rstest]
#[case(403, "PERMISSION_DENIED")]
#[case(503, "UNAVAILABLE")]
#[tokio::test]
async fn status_errors_keep_the_provider_detail(
    credentials: CredentialSlot,
    #[case] status: u16,
    #[case] code: &str,
) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/items/I-1")))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "error": {"message": "nope", "status": code},
        })))
        .mount(&server)
        .await;

    let error = store(&server, credentials)
        .get("items", "I-1")
        .await
        .expect_err("status error");
    assert!(
        error.to_string().contains(&format!("status {status}: {code}: nope")),
        "unexpected error: {error}"
    );
}

#[rstest]
#[tokio::test]
async fn the_access_layer_reads_firestore_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/Invoice/INV-1")))
        .and(header(
            "authorization",
            format!("Bearer {}", ada_token()).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/ledger-demo/databases/(default)/documents/Invoice/INV-1",
            "fields": {"total": {"doubleValue": 115.0}},
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/Invoice/private")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let settings = ClientSettings {
        binding: Some("firestore".to_owned()),
        firestore_endpoint: Some(server.uri()),
        firestore_project: Some("ledger-demo".to_owned()),
        ..ClientSettings::default()
    };
    let harness = Harness::signed_in(&settings);
    let invoices = harness.app.service("Invoice").expect("service");

    let record = invoices.get_by_id("INV-1").await.expect("record");
    assert_eq!(record, json!({"id": "INV-1", "total": 115.0}));

    let error = invoices
        .get_by_id("private")
        .await
        .expect_err("unauthenticated");
    assert_eq!(error.kind(), FailureKind::SessionExpired);
    assert!(!harness.app.session().credentials().is_attached());
}
