//! Domain primitives, services and ports.
//!
//! Purpose: model the console's access boundary independently of any
//! transport. Bindings in `outbound` implement the ports declared here; the
//! CLI in `inbound` drives the services.
//!
//! Public surface:
//! - `ApiService` / `AccessLayer`: four-verb access to a named resource.
//! - `ApiError` / `ApiResult`: the single normalised failure channel.
//! - `ErrorNormalizer` / `classify`: failure classification and forced logout.
//! - `SessionContext`: persisted identity and the attached credential.
//! - `AuthService`: login, signup and logout flows.
//! - `DocumentTotals` / `JournalTotals`: document arithmetic.

pub mod access;
pub mod auth;
pub mod auth_service;
pub mod error;
pub mod error_normalizer;
pub mod failure;
pub mod lookups;
pub mod ports;
pub mod resource;
pub mod session;
pub mod session_context;
pub mod totals;

pub use self::access::{AccessLayer, ApiService};
pub use self::auth::{
    DEFAULT_PROFILE_PICTURE, DUPLICATE_RECORD_MESSAGE, INVALID_LOGIN_MESSAGE, LoginCredentials,
    PASSWORD_MIN, REGISTRATION_FAILED_MESSAGE, Registration, USERNAME_EXISTS_MESSAGE,
};
pub use self::auth_service::{AuthService, RestAuthenticator, SIGN_IN_PATH, SIGN_RESOURCE};
pub use self::error::{
    ApiError, ApiErrorValidationError, ApiResult, CANCELLED_MESSAGE, CONNECTIVITY_MESSAGE,
    FailureKind, FieldErrors, NOT_AUTHORIZED_MESSAGE, REQUEST_FAILED_MESSAGE,
    SESSION_EXPIRED_MESSAGE, UNEXPECTED_MESSAGE, VALIDATION_MESSAGE,
};
pub use self::error_normalizer::{ErrorNormalizer, Normalized, classify};
pub use self::failure::{
    FailedResponse, NETWORK_ERROR_MARKER, REQUEST_FAILED_PREFIX, RequestFailure, ResponseBody,
};
pub use self::lookups::{DocumentLookups, load_document_lookups};
pub use self::resource::{ApiRequest, DeleteTarget, Method, ResourceName, ResourceNameError};
pub use self::session::{
    BearerToken, CredentialSlot, SessionClaims, SessionKey, SessionRecord, TokenDecodeError,
    decode_claims, decode_payload, token_expiry,
};
pub use self::session_context::{SessionContext, SessionError};
pub use self::totals::{
    DocumentTotals, JournalLine, JournalTotals, LineAmountType, LineItem, format_amount,
    format_rate,
};
