//! Authenticator over the Identity Toolkit REST API.
//!
//! Sign-in exchanges email and password for an ID token through
//! `accounts:signInWithPassword`; signup creates the account through
//! `accounts:signUp`. Claims come from the provider's response rather than
//! from the console's own token format.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::domain::ports::{Authenticator, SignedIn};
use crate::domain::{
    ApiError, ApiResult, BearerToken, DUPLICATE_RECORD_MESSAGE, FailureKind, LoginCredentials,
    REQUEST_FAILED_MESSAGE, Registration, SessionClaims, token_expiry,
};

const SIGN_IN_ACTION: &str = "accounts:signInWithPassword";
const SIGN_UP_ACTION: &str = "accounts:signUp";
const EMAIL_EXISTS: &str = "EMAIL_EXISTS";

/// Provider location and project credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityToolkitSettings {
    /// API root, normally `https://identitytoolkit.googleapis.com/`.
    pub endpoint: Url,
    /// Web API key of the project.
    pub api_key: String,
    /// Tenant to sign users into, for multi-tenant projects.
    pub tenant_id: Option<String>,
}

/// [`Authenticator`] backed by an identity provider.
#[derive(Debug, Clone)]
pub struct IdentityToolkitAuthenticator {
    client: Client,
    settings: IdentityToolkitSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequestDto<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountDto {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    id_token: String,
    tenant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelopeDto {
    error: ErrorDto,
}

#[derive(Debug, Deserialize)]
struct ErrorDto {
    #[serde(default)]
    message: String,
}

impl IdentityToolkitAuthenticator {
    /// Build an authenticator.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        settings: IdentityToolkitSettings,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            settings,
        })
    }

    fn action_url(&self, action: &str) -> ApiResult<Url> {
        let mut url = self.settings.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::client(format!(
                    "identity endpoint `{}` cannot carry a path",
                    self.settings.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(["v1", action]);
        url.query_pairs_mut()
            .append_pair("key", &self.settings.api_key);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        body: &PasswordRequestDto<'_>,
    ) -> ApiResult<T> {
        let url = self.action_url(action)?;
        debug!(action, "calling identity provider");
        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        serde_json::from_slice(bytes.as_ref()).map_err(|error| {
            ApiError::invalid_response(format!("identity provider response: {error}"))
        })
    }

    fn claims(&self, account: &AccountDto) -> SessionClaims {
        let (first_name, last_name) = split_display_name(&account.display_name);
        SessionClaims {
            user_id: account.local_id.clone(),
            tenant_id: account
                .tenant_id
                .clone()
                .or_else(|| self.settings.tenant_id.clone())
                .unwrap_or_default(),
            role: String::new(),
            first_name,
            last_name,
            email: account.email.clone(),
            expires_at: token_expiry(&account.id_token),
        }
    }
}

#[async_trait]
impl Authenticator for IdentityToolkitAuthenticator {
    async fn sign_in(&self, credentials: &LoginCredentials) -> ApiResult<SignedIn> {
        let request = PasswordRequestDto {
            email: credentials.email(),
            password: credentials.password(),
            display_name: None,
            tenant_id: self.settings.tenant_id.as_deref(),
            return_secure_token: true,
        };
        let account: AccountDto = self.call(SIGN_IN_ACTION, &request).await?;
        let token = BearerToken::new(account.id_token.clone())
            .ok_or_else(|| ApiError::invalid_response("identity provider returned no ID token"))?;
        Ok(SignedIn {
            claims: Some(self.claims(&account)),
            token,
            tenants: None,
        })
    }

    async fn register(&self, registration: &Registration) -> ApiResult<Value> {
        let display_name = format!(
            "{} {}",
            registration.first_name.trim(),
            registration.last_name.trim()
        );
        let request = PasswordRequestDto {
            email: registration.email.trim(),
            password: registration.password.as_str(),
            display_name: Some(display_name.trim().to_owned()),
            tenant_id: self.settings.tenant_id.as_deref(),
            return_secure_token: true,
        };
        let account: AccountDto = self.call(SIGN_UP_ACTION, &request).await?;
        Ok(json!({
            "result": true,
            "userId": account.local_id,
            "email": account.email,
        }))
    }

    async fn sign_out(&self) -> ApiResult<()> {
        // ID tokens are stateless; discarding the local session is sufficient.
        Ok(())
    }
}

fn split_display_name(display_name: &str) -> (String, String) {
    let trimmed = display_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_owned(), rest.trim().to_owned()),
        None => (trimmed.to_owned(), String::new()),
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    warn!(%error, "identity provider unreachable");
    ApiError::connectivity()
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let code = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_default();
    debug!(status = status.as_u16(), code = %code, "identity provider rejected request");
    if code == EMAIL_EXISTS {
        return ApiError::new(FailureKind::Server, DUPLICATE_RECORD_MESSAGE);
    }
    match status {
        StatusCode::UNAUTHORIZED => ApiError::not_authorized(),
        _ if code.is_empty() => ApiError::new(FailureKind::Request, REQUEST_FAILED_MESSAGE),
        _ => ApiError::new(FailureKind::Server, code),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network identity helpers.

    use super::*;
    use rstest::rstest;

    fn authenticator(tenant_id: Option<&str>) -> IdentityToolkitAuthenticator {
        let settings = IdentityToolkitSettings {
            endpoint: Url::parse("https://identitytoolkit.googleapis.com/").expect("endpoint"),
            api_key: "web-key".to_owned(),
            tenant_id: tenant_id.map(str::to_owned),
        };
        IdentityToolkitAuthenticator::new(settings, None).expect("client builds")
    }

    #[test]
    fn action_urls_carry_the_api_key() {
        let url = authenticator(None)
            .action_url(SIGN_IN_ACTION)
            .expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=web-key"
        );
    }

    #[rstest]
    #[case("Ada Lovelace", "Ada", "Lovelace")]
    #[case("  Grace  Brewster Hopper ", "Grace", "Brewster Hopper")]
    #[case("Cher", "Cher", "")]
    #[case("", "", "")]
    fn splits_display_names(#[case] display: &str, #[case] first: &str, #[case] last: &str) {
        assert_eq!(
            split_display_name(display),
            (first.to_owned(), last.to_owned())
        );
    }

    #[rstest]
    #[case::configured(None, Some("acme"), "acme")]
    #[case::response_wins(Some("globex"), Some("acme"), "globex")]
    #[case::unknown(None, None, "")]
    fn claims_prefer_the_response_tenant(
        #[case] response_tenant: Option<&str>,
        #[case] configured: Option<&str>,
        #[case] expected: &str,
    ) {
        let account = AccountDto {
            local_id: "uid-1".to_owned(),
            email: "ada@example.com".to_owned(),
            display_name: "Ada Lovelace".to_owned(),
            id_token: "opaque".to_owned(),
            tenant_id: response_tenant.map(str::to_owned),
        };
        let claims = authenticator(configured).claims(&account);
        assert_eq!(claims.tenant_id, expected);
        assert_eq!(claims.first_name, "Ada");
        assert_eq!(claims.expires_at, None);
    }

    #[rstest]
    #[case::duplicate(StatusCode::BAD_REQUEST, r#"{"error":{"message":"EMAIL_EXISTS"}}"#, DUPLICATE_RECORD_MESSAGE)]
    #[case::bad_password(
        StatusCode::BAD_REQUEST,
        r#"{"error":{"message":"INVALID_LOGIN_CREDENTIALS"}}"#,
        "INVALID_LOGIN_CREDENTIALS"
    )]
    #[case::no_body(StatusCode::INTERNAL_SERVER_ERROR, "", REQUEST_FAILED_MESSAGE)]
    fn maps_provider_errors(#[case] status: StatusCode, #[case] body: &str, #[case] message: &str) {
        assert_eq!(map_status_error(status, body.as_bytes()).message(), message);
    }
}
