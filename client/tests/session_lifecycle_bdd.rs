//! Behaviour tests for the persisted session.
//!
//! These scenarios run the session context over file-backed storage so a
//! restart can be simulated by reopening the same file.

mod support;

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Arc;

use ledger_client::domain::ports::SessionStorage;
use ledger_client::domain::{SessionContext, SessionError, SessionKey};
use ledger_client::outbound::storage::FileSessionStorage;
use mockable::DefaultClock;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Map, Value, json};
use support::{ada_token, token_with};
use tempfile::TempDir;

struct SessionWorld {
    dir: TempDir,
    session: RefCell<Option<SessionContext>>,
    outcome: RefCell<Option<Result<(), SessionError>>>,
}

impl SessionWorld {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temporary directory"),
            session: RefCell::new(None),
            outcome: RefCell::new(None),
        }
    }

    fn path(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    fn open(&self) {
        let storage = FileSessionStorage::open(&self.path()).expect("storage opens");
        let session = SessionContext::new(Arc::new(storage), Arc::new(DefaultClock));
        session
            .set_authorization_token()
            .expect("stored token restores");
        *self.session.borrow_mut() = Some(session);
    }

    fn session(&self) -> SessionContext {
        self.session
            .borrow()
            .clone()
            .expect("session should be open")
    }

    fn sign_in(&self, token: &str) {
        let session = self.session();
        let outcome = session
            .set_session(token)
            .and_then(|_| session.set_authorization_token().map(|_| ()));
        *self.outcome.borrow_mut() = Some(outcome);
    }

    fn file(&self) -> Map<String, Value> {
        match std::fs::read_to_string(self.path()) {
            Ok(text) => serde_json::from_str(&text).expect("session file is JSON"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(error) => panic!("read session file: {error}"),
        }
    }
}

#[fixture]
fn world() -> SessionWorld {
    SessionWorld::new()
}

#[given("an empty session file")]
fn an_empty_session_file(world: &SessionWorld) {
    world.open();
}

#[given("a session file with an unrelated \"{name}\" setting")]
fn a_session_file_with_setting(world: &SessionWorld, name: String) {
    let mut contents = Map::new();
    contents.insert(name, json!("dark"));
    std::fs::write(world.path(), Value::Object(contents).to_string())
        .expect("seed session file");
    world.open();
}

#[given("the user signs in with a valid token")]
fn the_user_has_signed_in(world: &SessionWorld) {
    world.sign_in(&ada_token());
}

#[when("the user signs in with a valid token")]
fn the_user_signs_in(world: &SessionWorld) {
    world.sign_in(&ada_token());
}

#[when("the user signs in with a token that expired in 2000")]
fn the_user_signs_in_with_an_expired_token(world: &SessionWorld) {
    world.sign_in(&token_with(&json!({
        "UserId": "u-1",
        "TenantId": "t-1",
        "exp": 946_684_800_i64,
    })));
}

#[when("the user signs in with a token that lacks a tenant")]
fn the_user_signs_in_without_a_tenant(world: &SessionWorld) {
    world.sign_in(&token_with(&json!({"UserId": "u-1"})));
}

#[when("the client restarts")]
fn the_client_restarts(world: &SessionWorld) {
    world.open();
}

#[when("the user logs out")]
fn the_user_logs_out(world: &SessionWorld) {
    world.session().logout().expect("logout succeeds");
}

#[then("the session file holds the user's identity")]
fn the_file_holds_the_identity(world: &SessionWorld) {
    let file = world.file();
    assert_eq!(file.get("jwt"), Some(&json!(ada_token())));
    assert_eq!(file.get("userId"), Some(&json!("u-1")));
    assert_eq!(file.get("tenantId"), Some(&json!("t-1")));
    assert_eq!(file.get("role"), Some(&json!("Admin")));
}

#[then("the credential is attached")]
fn the_credential_is_attached(world: &SessionWorld) {
    assert!(world.session().credentials().is_attached());
}

#[then("the credential is detached")]
fn the_credential_is_detached(world: &SessionWorld) {
    assert!(!world.session().credentials().is_attached());
}

#[then("the display name is \"{name}\"")]
fn the_display_name_is(world: &SessionWorld, name: String) {
    let record = world
        .session()
        .snapshot()
        .expect("snapshot")
        .expect("signed in");
    assert_eq!(record.display_name(), name);
}

#[then("no session keys remain")]
fn no_session_keys_remain(world: &SessionWorld) {
    let session = world.session();
    assert_eq!(session.snapshot().expect("snapshot"), None);
    let file = world.file();
    for key in SessionKey::ALL {
        assert!(!file.contains_key(key.as_str()), "{key} should be removed");
    }
}

#[then("the \"{name}\" setting is still present")]
fn the_setting_is_still_present(world: &SessionWorld, name: String) {
    assert_eq!(world.file().get(&name), Some(&json!("dark")));
}

#[then("the session is expired")]
fn the_session_is_expired(world: &SessionWorld) {
    assert!(world.session().is_expired().expect("expiry"));
}

#[then("the sign-in is rejected")]
fn the_sign_in_is_rejected(world: &SessionWorld) {
    let outcome = world.outcome.borrow();
    assert!(matches!(
        outcome.as_ref().expect("sign-in attempted"),
        Err(SessionError::InvalidToken(_))
    ));
}

#[scenario(path = "tests/features/session_lifecycle.feature", index = 0)]
fn signing_in_persists_the_identity(world: SessionWorld) {
    drop(world);
}

#[scenario(path = "tests/features/session_lifecycle.feature", index = 1)]
fn restarts_restore_the_credential(world: SessionWorld) {
    drop(world);
}

#[scenario(path = "tests/features/session_lifecycle.feature", index = 2)]
fn logout_keeps_unrelated_settings(world: SessionWorld) {
    drop(world);
}

#[scenario(path = "tests/features/session_lifecycle.feature", index = 3)]
fn expired_tokens_are_reported(world: SessionWorld) {
    drop(world);
}

#[scenario(path = "tests/features/session_lifecycle.feature", index = 4)]
fn tenantless_tokens_are_rejected(world: SessionWorld) {
    drop(world);
}
