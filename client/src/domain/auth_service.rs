//! Sign-in, signup and sign-out use-cases.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::failure::is_truthy;
use crate::domain::ports::{Authenticator, SignedIn};
use crate::domain::{
    AccessLayer, ApiError, ApiResult, ApiService, BearerToken, DEFAULT_PROFILE_PICTURE,
    DUPLICATE_RECORD_MESSAGE, FailureKind, INVALID_LOGIN_MESSAGE, LoginCredentials,
    REGISTRATION_FAILED_MESSAGE, Registration, ResourceName, SessionClaims, SessionContext,
    USERNAME_EXISTS_MESSAGE,
};

/// Resource that hosts the sign-in and signup endpoints.
pub const SIGN_RESOURCE: &str = "sign";
/// Sub-path of the sign-in action.
pub const SIGN_IN_PATH: &str = "sign-in";

/// Authenticator backed by the REST `sign` controller.
///
/// Sign-in runs as an auth page so a 401 reports rejected credentials instead
/// of ending a session. Signup runs as an ordinary page.
#[derive(Debug, Clone)]
pub struct RestAuthenticator {
    sign_in: ApiService,
    sign_up: ApiService,
}

impl RestAuthenticator {
    /// Build over the shared access layer.
    pub fn new(access: &AccessLayer) -> ApiResult<Self> {
        let resource =
            ResourceName::new(SIGN_RESOURCE).map_err(|error| ApiError::client(error.to_string()))?;
        Ok(Self {
            sign_in: access.service(resource.clone()).for_auth_page(),
            sign_up: access.service(resource),
        })
    }
}

#[async_trait]
impl Authenticator for RestAuthenticator {
    async fn sign_in(&self, credentials: &LoginCredentials) -> ApiResult<SignedIn> {
        let response = self
            .sign_in
            .post(credentials.to_payload(), Some(SIGN_IN_PATH))
            .await?;
        let token = response
            .get("result")
            .filter(|value| is_truthy(value))
            .and_then(Value::as_str)
            .and_then(BearerToken::new)
            .ok_or_else(|| ApiError::invalid_response("sign-in response carried no token"))?;
        let tenants = response
            .get("tenantList")
            .filter(|value| is_truthy(value))
            .cloned();
        Ok(SignedIn {
            token,
            claims: None,
            tenants,
        })
    }

    async fn register(&self, registration: &Registration) -> ApiResult<Value> {
        let response = self.sign_up.post(registration.to_payload(), None).await?;
        if response.get("result").is_some_and(is_truthy) {
            Ok(response)
        } else {
            Err(ApiError::new(
                FailureKind::Server,
                REGISTRATION_FAILED_MESSAGE,
            ))
        }
    }

    async fn sign_out(&self) -> ApiResult<()> {
        Ok(())
    }
}

/// Login, signup and logout flows over an [`Authenticator`].
#[derive(Clone)]
pub struct AuthService {
    authenticator: Arc<dyn Authenticator>,
    session: SessionContext,
}

impl AuthService {
    /// Combine an authenticator with the session it populates.
    pub fn new(authenticator: Arc<dyn Authenticator>, session: SessionContext) -> Self {
        Self {
            authenticator,
            session,
        }
    }

    /// Validate the form, sign in, persist the session and start attaching
    /// the credential.
    ///
    /// Any rejection other than a connectivity failure or cancellation
    /// reports [`INVALID_LOGIN_MESSAGE`].
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<SessionClaims> {
        let credentials =
            LoginCredentials::try_from_parts(email, password).map_err(|errors| {
                ApiError::validation(&errors)
            })?;
        let signed_in = self
            .authenticator
            .sign_in(&credentials)
            .await
            .map_err(login_error)?;

        let claims = match signed_in.claims {
            Some(claims) => {
                self.session
                    .set_session_with_claims(&signed_in.token, &claims)?;
                claims
            }
            None => self.session.set_session(signed_in.token.expose())?,
        };
        self.session.set_authorization_token()?;
        if let Some(tenants) = &signed_in.tenants {
            self.session.remember_tenants(tenants)?;
        }
        self.session
            .remember_profile_picture(DEFAULT_PROFILE_PICTURE)?;
        info!(user_id = %claims.user_id, "signed in");
        Ok(claims)
    }

    /// Validate the signup form and create the account.
    pub async fn register(&self, registration: &Registration) -> ApiResult<Value> {
        registration
            .validate()
            .map_err(|errors| ApiError::validation(&errors))?;
        self.authenticator
            .register(registration)
            .await
            .map_err(registration_error)
    }

    /// Sign out of the provider, then clear the local session.
    ///
    /// Provider failures are logged; the local session is cleared regardless.
    pub async fn logout(&self) -> ApiResult<()> {
        if let Err(error) = self.authenticator.sign_out().await {
            warn!(%error, "provider sign-out failed; clearing local session anyway");
        }
        self.session.logout()?;
        Ok(())
    }

    /// Session populated by [`Self::login`].
    pub fn session(&self) -> &SessionContext {
        &self.session
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn login_error(error: ApiError) -> ApiError {
    match error.kind() {
        FailureKind::Connectivity | FailureKind::Cancelled => error,
        _ => ApiError::new(FailureKind::NotAuthorized, INVALID_LOGIN_MESSAGE),
    }
}

fn registration_error(error: ApiError) -> ApiError {
    match error.kind() {
        FailureKind::Connectivity | FailureKind::Cancelled => error,
        _ if error.message() == DUPLICATE_RECORD_MESSAGE => {
            ApiError::new(FailureKind::Server, USERNAME_EXISTS_MESSAGE)
        }
        _ => ApiError::new(FailureKind::Server, REGISTRATION_FAILED_MESSAGE),
    }
}
