//! Session primitives: persisted keys, bearer tokens and identity claims.
//!
//! Tokens are decoded without signature verification. The backend issued the
//! token in response to a successful login and remains the only party that
//! validates it.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

/// Keys persisted in session storage.
///
/// The wire names match what the console has always written so an existing
/// storage file keeps working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {
    /// Raw bearer token.
    Token,
    /// Authenticated user id.
    UserId,
    /// Tenant the user is signed into.
    TenantId,
    /// Role name.
    Role,
    /// Given name.
    FirstName,
    /// Family name.
    LastName,
    /// Email address.
    Email,
    /// Cached profile picture URL.
    ProfilePicture,
    /// Tenant list returned at login.
    Tenants,
}

impl SessionKey {
    /// Every key, in storage order.
    pub const ALL: [Self; 9] = [
        Self::Token,
        Self::UserId,
        Self::TenantId,
        Self::Role,
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::ProfilePicture,
        Self::Tenants,
    ];

    /// Persisted key name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "jwt",
            Self::UserId => "userId",
            Self::TenantId => "tenantId",
            Self::Role => "role",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::ProfilePicture => "profilePicture",
            Self::Tenants => "tenants",
        }
    }

    /// Resolve a persisted key name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bearer credential. Zeroised on drop and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Wrap a raw token, rejecting blank input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(Zeroizing::new(raw)))
        }
    }

    /// Raw token text.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Value for the `Authorization` header.
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Errors raised while decoding identity claims from a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenDecodeError {
    /// The token does not have a payload segment.
    #[error("token is not a JWT: missing payload segment")]
    MissingPayload,
    /// The payload segment is not base64url.
    #[error("token payload is not valid base64url: {message}")]
    InvalidEncoding {
        /// Decoder diagnostic.
        message: String,
    },
    /// The payload is not a JSON object.
    #[error("token payload is not a JSON object: {message}")]
    InvalidJson {
        /// Parser diagnostic.
        message: String,
    },
    /// A claim required to build a session is absent.
    #[error("token is missing required claim `{claim}`")]
    MissingClaim {
        /// Claim name.
        claim: &'static str,
    },
}

/// Identity claims written into session storage at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Authenticated user id.
    pub user_id: String,
    /// Tenant id.
    pub tenant_id: String,
    /// Role name, empty when absent.
    pub role: String,
    /// Given name, empty when absent.
    pub first_name: String,
    /// Family name, empty when absent.
    pub last_name: String,
    /// Email, empty when absent.
    pub email: String,
    /// Expiry from the `exp` claim.
    pub expires_at: Option<DateTime<Utc>>,
}

const CLAIM_USER_ID: &str = "UserId";
const CLAIM_TENANT_ID: &str = "TenantId";
const CLAIM_ROLE: &str = "Role";
const CLAIM_FIRST_NAME: &str = "FirstName";
const CLAIM_LAST_NAME: &str = "LastName";
const CLAIM_EMAIL: &str = "Email";
const CLAIM_EXPIRY: &str = "exp";

/// Decode the payload segment of a JWT into its raw claim map.
pub fn decode_payload(token: &str) -> Result<Map<String, Value>, TokenDecodeError> {
    let segment = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenDecodeError::MissingPayload)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|error| TokenDecodeError::InvalidEncoding {
            message: error.to_string(),
        })?;
    serde_json::from_slice::<Map<String, Value>>(&bytes).map_err(|error| {
        TokenDecodeError::InvalidJson {
            message: error.to_string(),
        }
    })
}

/// Decode the console's identity claims from a bearer token.
///
/// # Examples
/// ```
/// use base64::Engine;
/// use base64::engine::general_purpose::URL_SAFE_NO_PAD;
/// use ledger_client::domain::decode_claims;
///
/// let payload = URL_SAFE_NO_PAD.encode(r#"{"UserId":"u-1","TenantId":"t-9","Role":"Admin"}"#);
/// let token = format!("header.{payload}.signature");
/// let claims = decode_claims(&token).unwrap();
/// assert_eq!(claims.user_id, "u-1");
/// assert_eq!(claims.first_name, "");
/// ```
pub fn decode_claims(token: &str) -> Result<SessionClaims, TokenDecodeError> {
    let claims = decode_payload(token)?;
    Ok(SessionClaims {
        user_id: required_claim(&claims, CLAIM_USER_ID)?,
        tenant_id: required_claim(&claims, CLAIM_TENANT_ID)?,
        role: optional_claim(&claims, CLAIM_ROLE),
        first_name: optional_claim(&claims, CLAIM_FIRST_NAME),
        last_name: optional_claim(&claims, CLAIM_LAST_NAME),
        email: optional_claim(&claims, CLAIM_EMAIL),
        expires_at: expiry_claim(&claims),
    })
}

/// Read the expiry of any JWT without requiring the console's claim set.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    decode_payload(token).ok().as_ref().and_then(expiry_claim)
}

fn claim_text(claims: &Map<String, Value>, name: &str) -> Option<String> {
    match claims.get(name)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn required_claim(
    claims: &Map<String, Value>,
    name: &'static str,
) -> Result<String, TokenDecodeError> {
    claim_text(claims, name).ok_or(TokenDecodeError::MissingClaim { claim: name })
}

fn optional_claim(claims: &Map<String, Value>, name: &str) -> String {
    claim_text(claims, name).unwrap_or_default()
}

fn expiry_claim(claims: &Map<String, Value>) -> Option<DateTime<Utc>> {
    claims
        .get(CLAIM_EXPIRY)
        .and_then(Value::as_i64)
        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
}

/// Typed snapshot of everything persisted for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Bearer token.
    pub token: BearerToken,
    /// User id.
    pub user_id: String,
    /// Tenant id.
    pub tenant_id: String,
    /// Role, empty when unknown.
    pub role: String,
    /// Given name, empty when unknown.
    pub first_name: String,
    /// Family name, empty when unknown.
    pub last_name: String,
    /// Email, empty when unknown.
    pub email: String,
    /// Cached profile picture URL, empty when unknown.
    pub profile_picture: String,
    /// Tenant list returned at login, empty when unknown.
    pub tenants: String,
}

impl SessionRecord {
    /// `First Last`, trimmed; empty when neither name is known.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Shared handle to the credential attached to every outgoing request.
///
/// Cloning shares the slot, so a binding constructed at start-up observes a
/// token attached later by the session context.
#[derive(Clone, Default)]
pub struct CredentialSlot(Arc<RwLock<Option<BearerToken>>>);

impl CredentialSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credential to attach to the next request, if any.
    pub fn current(&self) -> Option<BearerToken> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Attach `token` to all subsequent requests.
    pub fn attach(&self, token: BearerToken) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Stop attaching any credential.
    pub fn detach(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a credential is attached.
    pub fn is_attached(&self) -> bool {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}
