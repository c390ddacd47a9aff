//! Injected session context: the single owner of persisted identity and the
//! credential attached to outgoing requests.
//!
//! State machine: anonymous → (login) → authenticated → (logout | 401) →
//! anonymous. There is no refresh path; [`SessionContext::is_expired`] only
//! reports expiry so callers can prompt for a fresh login.

use std::sync::Arc;

use mockable::Clock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::ports::{SessionStorage, SessionStorageError};
use crate::domain::session::{decode_claims, token_expiry};
use crate::domain::{
    ApiError, BearerToken, CredentialSlot, SessionClaims, SessionKey, SessionRecord,
    TokenDecodeError,
};

/// Errors raised by [`SessionContext`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The token was blank.
    #[error("session token must not be empty")]
    EmptyToken,
    /// The token's claims could not be decoded.
    #[error(transparent)]
    InvalidToken(#[from] TokenDecodeError),
    /// The storage adapter failed.
    #[error(transparent)]
    Storage(#[from] SessionStorageError),
}

impl From<SessionError> for ApiError {
    fn from(value: SessionError) -> Self {
        ApiError::client(value.to_string())
    }
}

/// Explicit session context shared by the access layer and the pages.
///
/// Cloning shares the storage, the credential slot and the clock.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use ledger_client::domain::SessionContext;
/// use ledger_client::domain::ports::InMemorySessionStorage;
/// use mockable::DefaultClock;
///
/// let session = SessionContext::new(
///     Arc::new(InMemorySessionStorage::new()),
///     Arc::new(DefaultClock),
/// );
/// assert!(session.set_authorization_token().is_ok());
/// assert!(!session.credentials().is_attached());
/// ```
#[derive(Clone)]
pub struct SessionContext {
    storage: Arc<dyn SessionStorage>,
    credentials: CredentialSlot,
    clock: Arc<dyn Clock>,
}

impl SessionContext {
    /// Build a context with a fresh credential slot.
    pub fn new(storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> Self {
        Self::with_credentials(storage, CredentialSlot::new(), clock)
    }

    /// Build a context around an existing credential slot.
    pub fn with_credentials(
        storage: Arc<dyn SessionStorage>,
        credentials: CredentialSlot,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            credentials,
            clock,
        }
    }

    /// Credential slot to hand to bindings.
    pub fn credentials(&self) -> &CredentialSlot {
        &self.credentials
    }

    /// Persist a freshly issued token and the claims decoded from it.
    ///
    /// The signature is not checked; the token has just been returned by a
    /// successful login call.
    pub fn set_session(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let bearer = BearerToken::new(token).ok_or(SessionError::EmptyToken)?;
        let claims = decode_claims(bearer.expose())?;
        self.set_session_with_claims(&bearer, &claims)?;
        Ok(claims)
    }

    /// Persist a token together with claims supplied by an identity provider.
    pub fn set_session_with_claims(
        &self,
        token: &BearerToken,
        claims: &SessionClaims,
    ) -> Result<(), SessionError> {
        let entries = [
            (SessionKey::Token, token.expose()),
            (SessionKey::UserId, claims.user_id.as_str()),
            (SessionKey::Role, claims.role.as_str()),
            (SessionKey::TenantId, claims.tenant_id.as_str()),
            (SessionKey::FirstName, claims.first_name.as_str()),
            (SessionKey::LastName, claims.last_name.as_str()),
            (SessionKey::Email, claims.email.as_str()),
        ];
        for (key, value) in entries {
            self.storage.set(key, value)?;
        }
        info!(
            user_id = %claims.user_id,
            tenant_id = %claims.tenant_id,
            "session established"
        );
        Ok(())
    }

    /// Attach the stored token to outgoing requests, or detach any stale
    /// credential when none is stored. Returns whether a credential is now
    /// attached.
    pub fn set_authorization_token(&self) -> Result<bool, SessionError> {
        match self.stored_token()? {
            Some(token) => {
                self.credentials.attach(token);
                debug!("bearer credential attached");
                Ok(true)
            }
            None => {
                self.credentials.detach();
                debug!("no stored token; bearer credential detached");
                Ok(false)
            }
        }
    }

    /// End the session: detach the credential and remove every key.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.credentials.detach();
        self.storage.clear()?;
        info!("session cleared");
        Ok(())
    }

    /// End the session without reporting storage failures.
    ///
    /// Used on the error path, where the caller already has an error to show.
    pub fn force_clear(&self) {
        self.credentials.detach();
        match self.storage.clear() {
            Ok(()) => info!("session cleared after authentication failure"),
            Err(error) => warn!(%error, "failed to clear session storage"),
        }
    }

    /// Everything persisted for the signed-in user, or `None` when anonymous.
    pub fn snapshot(&self) -> Result<Option<SessionRecord>, SessionError> {
        let Some(token) = self.stored_token()? else {
            return Ok(None);
        };
        Ok(Some(SessionRecord {
            token,
            user_id: self.read(SessionKey::UserId)?,
            tenant_id: self.read(SessionKey::TenantId)?,
            role: self.read(SessionKey::Role)?,
            first_name: self.read(SessionKey::FirstName)?,
            last_name: self.read(SessionKey::LastName)?,
            email: self.read(SessionKey::Email)?,
            profile_picture: self.read(SessionKey::ProfilePicture)?,
            tenants: self.read(SessionKey::Tenants)?,
        }))
    }

    /// Whether the stored token's `exp` has passed. Anonymous sessions and
    /// tokens without `exp` are never expired.
    pub fn is_expired(&self) -> Result<bool, SessionError> {
        let Some(token) = self.stored_token()? else {
            return Ok(false);
        };
        Ok(token_expiry(token.expose()).is_some_and(|expires_at| expires_at <= self.clock.utc()))
    }

    /// Persist the tenant list returned at login.
    pub fn remember_tenants(&self, tenants: &Value) -> Result<(), SessionError> {
        let text = match tenants {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        self.storage.set(SessionKey::Tenants, &text)?;
        Ok(())
    }

    /// Persist the profile picture URL shown in the top bar.
    pub fn remember_profile_picture(&self, url: &str) -> Result<(), SessionError> {
        self.storage.set(SessionKey::ProfilePicture, url)?;
        Ok(())
    }

    fn stored_token(&self) -> Result<Option<BearerToken>, SessionError> {
        Ok(self
            .storage
            .get(SessionKey::Token)?
            .and_then(BearerToken::new))
    }

    fn read(&self, key: SessionKey) -> Result<String, SessionError> {
        Ok(self.storage.get(key)?.unwrap_or_default())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
