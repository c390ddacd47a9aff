//! Driven port for the identity backend behind the login and signup pages.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ApiResult, BearerToken, LoginCredentials, Registration, SessionClaims};

/// Outcome of a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    /// Bearer token issued by the backend.
    pub token: BearerToken,
    /// Claims supplied by an identity provider. `None` means the claims
    /// must be decoded from the token itself.
    pub claims: Option<SessionClaims>,
    /// Tenants the user may switch between, when the backend lists them.
    pub tenants: Option<Value>,
}

/// Port for signing users in, up and out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn sign_in(&self, credentials: &LoginCredentials) -> ApiResult<SignedIn>;

    /// Create an account. Returns the backend's response body.
    async fn register(&self, registration: &Registration) -> ApiResult<Value>;

    /// End the provider-side session. Backends without one succeed trivially.
    async fn sign_out(&self) -> ApiResult<()>;
}
