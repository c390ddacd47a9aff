//! Session lifecycle coverage.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Local, Utc};
use mockable::MockClock;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ports::{InMemorySessionStorage, MockSessionStorage};

const EXPIRY: i64 = 1_800_000_000;

fn token() -> String {
    let payload = json!({
        "UserId": "u-7",
        "TenantId": "acme",
        "Role": "Admin",
        "FirstName": "Grace",
        "LastName": "Hopper",
        "exp": EXPIRY
    });
    format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload.to_string()))
}

fn clock_at(seconds: i64) -> Arc<dyn Clock> {
    let now = DateTime::<Utc>::from_timestamp(seconds, 0).expect("valid timestamp");
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(now);
    clock.expect_local().return_const(now.with_timezone(&Local));
    Arc::new(clock)
}

struct Harness {
    storage: Arc<InMemorySessionStorage>,
    session: SessionContext,
}

#[fixture]
fn harness() -> Harness {
    let storage = Arc::new(InMemorySessionStorage::new());
    let session = SessionContext::new(storage.clone(), clock_at(EXPIRY - 60));
    Harness { storage, session }
}

#[rstest]
fn set_session_writes_every_claim(harness: Harness) {
    let claims = harness.session.set_session(&token()).expect("session set");
    assert_eq!(claims.user_id, "u-7");

    let stored = |key: SessionKey| harness.storage.get(key).expect("read").unwrap_or_default();
    assert_eq!(stored(SessionKey::Token), token());
    assert_eq!(stored(SessionKey::UserId), "u-7");
    assert_eq!(stored(SessionKey::TenantId), "acme");
    assert_eq!(stored(SessionKey::Role), "Admin");
    assert_eq!(stored(SessionKey::Email), "");
}

#[rstest]
fn authorization_follows_the_stored_token(harness: Harness) {
    harness.session.set_session(&token()).expect("session set");
    assert!(harness.session.set_authorization_token().expect("attach"));
    let attached = harness.session.credentials().current().expect("credential");
    assert_eq!(attached.expose(), token());

    harness.session.logout().expect("logout");
    assert!(!harness.session.credentials().is_attached());
    assert!(harness.storage.is_empty());
    assert!(!harness.session.set_authorization_token().expect("detach"));
}

#[rstest]
fn snapshot_is_none_when_anonymous(harness: Harness) {
    assert_eq!(harness.session.snapshot().expect("snapshot"), None);
}

#[rstest]
fn snapshot_reads_extras(harness: Harness) {
    harness.session.set_session(&token()).expect("session set");
    harness
        .session
        .remember_tenants(&json!([{"id": "acme"}]))
        .expect("tenants");
    harness
        .session
        .remember_profile_picture("https://example.com/p.png")
        .expect("picture");

    let record = harness
        .session
        .snapshot()
        .expect("snapshot")
        .expect("signed in");
    assert_eq!(record.display_name(), "Grace Hopper");
    assert_eq!(record.tenants, r#"[{"id":"acme"}]"#);
    assert_eq!(record.profile_picture, "https://example.com/p.png");
}

#[rstest]
#[case(EXPIRY - 1, false)]
#[case(EXPIRY, true)]
#[case(EXPIRY + 3600, true)]
fn expiry_is_checked_against_the_clock(#[case] now: i64, #[case] expected: bool) {
    let storage = Arc::new(InMemorySessionStorage::new());
    let session = SessionContext::new(storage, clock_at(now));
    session.set_session(&token()).expect("session set");
    assert_eq!(session.is_expired().expect("expiry"), expected);
}

#[rstest]
fn anonymous_sessions_are_not_expired(harness: Harness) {
    assert!(!harness.session.is_expired().expect("expiry"));
}

#[rstest]
fn rejects_blank_and_undecodable_tokens(harness: Harness) {
    assert_eq!(
        harness.session.set_session(" "),
        Err(SessionError::EmptyToken)
    );
    assert!(matches!(
        harness.session.set_session("not-a-jwt"),
        Err(SessionError::InvalidToken(_))
    ));
    assert!(harness.storage.is_empty());
}

#[test]
fn force_clear_swallows_storage_failures() {
    let mut storage = MockSessionStorage::new();
    storage
        .expect_clear()
        .times(1)
        .returning(|| Err(SessionStorageError::io("read-only volume")));
    let credentials = CredentialSlot::new();
    credentials.attach(BearerToken::new("abc").expect("token"));
    let session =
        SessionContext::with_credentials(Arc::new(storage), credentials.clone(), clock_at(0));

    session.force_clear();

    assert!(!credentials.is_attached());
}

#[test]
fn logout_reports_storage_failures() {
    let mut storage = MockSessionStorage::new();
    storage
        .expect_clear()
        .returning(|| Err(SessionStorageError::io("read-only volume")));
    let session = SessionContext::new(Arc::new(storage), clock_at(0));

    let err = session.logout().expect_err("storage failure surfaces");
    assert!(matches!(err, SessionError::Storage(_)));
}
