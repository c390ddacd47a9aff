//! Shared helpers for ledger client integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ledger_client::ClientApp;
use ledger_client::config::ClientSettings;
use ledger_client::domain::SessionKey;
use ledger_client::domain::ports::{InMemorySessionStorage, RecordingNavigator, SessionStorage};
use mockable::DefaultClock;
use serde_json::{Value, json};

/// Unsigned JWT carrying `claims`; the client never checks signatures.
pub fn token_with(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "none", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Token for Ada at tenant `t-1`, valid until 2100.
pub fn ada_token() -> String {
    token_with(&json!({
        "UserId": "u-1",
        "TenantId": "t-1",
        "Role": "Admin",
        "FirstName": "Ada",
        "LastName": "Lovelace",
        "Email": "ada@example.com",
        "exp": 4_102_444_800_i64,
    }))
}

/// Client wired against one backend, with inspectable storage and
/// navigation.
pub struct Harness {
    pub app: ClientApp,
    pub storage: Arc<InMemorySessionStorage>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    /// Build over `settings` with an empty session.
    pub fn new(settings: &ClientSettings) -> Self {
        Self::with_storage(settings, Arc::new(InMemorySessionStorage::new()))
    }

    /// Build over `settings` with a persisted, unexpired session.
    pub fn signed_in(settings: &ClientSettings) -> Self {
        let storage = Arc::new(InMemorySessionStorage::new());
        for (key, value) in [
            (SessionKey::Token, ada_token()),
            (SessionKey::UserId, "u-1".to_owned()),
            (SessionKey::TenantId, "t-1".to_owned()),
            (SessionKey::Email, "ada@example.com".to_owned()),
        ] {
            storage.set(key, &value).expect("seed session");
        }
        Self::with_storage(settings, storage)
    }

    fn with_storage(settings: &ClientSettings, storage: Arc<InMemorySessionStorage>) -> Self {
        let navigator = Arc::new(RecordingNavigator::new());
        let app = ClientApp::assemble(
            settings,
            storage.clone(),
            navigator.clone(),
            Arc::new(DefaultClock),
        )
        .expect("client assembles");
        Self {
            app,
            storage,
            navigator,
        }
    }

    /// Stored value for `key`, if any.
    pub fn stored(&self, key: SessionKey) -> Option<String> {
        self.storage.get(key).expect("read storage")
    }
}

/// Settings for the REST binding rooted at `<server>/api`.
pub fn rest_settings(server_uri: &str) -> ClientSettings {
    ClientSettings {
        base_url: Some(format!("{server_uri}/api")),
        ..ClientSettings::default()
    }
}
