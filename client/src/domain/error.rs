//! Normalised error payload returned by every access-layer call.
//!
//! Whatever went wrong (transport, server, session expiry, client-side
//! validation) callers receive one [`ApiError`] carrying a non-empty
//! human-readable message. Adapters never leak their own error types past the
//! access boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message shown when a 401 forces the session to end.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";
/// Message shown when credentials are rejected on a login or signup page.
pub const NOT_AUTHORIZED_MESSAGE: &str =
    "You are not authorized to perform this action. Please check your credentials.";
/// Message shown when the backend could not be reached at all.
pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection.";
/// Message shown for a bare HTTP failure that carried no usable body.
pub const REQUEST_FAILED_MESSAGE: &str = "An error occurred while processing your request.";
/// Last-resort message when a failure carries no information at all.
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";
/// Message used when an in-flight request was cancelled by its owner.
pub const CANCELLED_MESSAGE: &str = "The request was cancelled before it completed.";
/// Summary message attached to client-side validation failures.
pub const VALIDATION_MESSAGE: &str = "Please check the form for errors and try again.";

/// Stable machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A 401 outside an auth page ended the session.
    SessionExpired,
    /// A 401 on a login/signup page with nothing else to report.
    NotAuthorized,
    /// The server rejected the request and explained why.
    Server,
    /// No response reached the client.
    Connectivity,
    /// An HTTP failure without an explanatory body.
    Request,
    /// A client-side exception (programmer error, bad input to an adapter).
    Client,
    /// The caller cancelled the request.
    Cancelled,
    /// The server answered successfully with a body of the wrong shape.
    InvalidResponse,
    /// Client-side form validation rejected the input before any request.
    Validation,
    /// Nothing usable was known about the failure.
    Unexpected,
}

/// Normalised access-layer error.
///
/// ## Invariants
/// - `message` is non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use ledger_client::domain::{ApiError, FailureKind};
///
/// let err = ApiError::new(FailureKind::Server, "Invoice number already used");
/// assert_eq!(err.kind(), FailureKind::Server);
/// assert_eq!(err.message(), "Invoice number already used");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ApiErrorDto", into = "ApiErrorDto")]
pub struct ApiError {
    kind: FailureKind,
    message: String,
    details: Option<Value>,
}

/// Validation errors emitted by the [`ApiError`] constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiErrorValidationError {
    /// The message was empty or whitespace.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl ApiError {
    /// Create an error from a message known to be non-empty.
    ///
    /// Blank messages are replaced with [`UNEXPECTED_MESSAGE`] so the
    /// invariant holds without panicking.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::try_new(kind, message).unwrap_or_else(|_| Self {
            kind,
            message: UNEXPECTED_MESSAGE.to_owned(),
            details: None,
        })
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Result<Self, ApiErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ApiErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            kind,
            message,
            details: None,
        })
    }

    /// Failure category.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Human-readable message suitable for a toast.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Structured details, such as the server body the message came from.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Whether this error ended the current session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self.kind, FailureKind::SessionExpired)
    }

    /// Convenience constructor for [`FailureKind::SessionExpired`].
    pub fn session_expired() -> Self {
        Self::new(FailureKind::SessionExpired, SESSION_EXPIRED_MESSAGE)
    }

    /// Convenience constructor for [`FailureKind::NotAuthorized`].
    pub fn not_authorized() -> Self {
        Self::new(FailureKind::NotAuthorized, NOT_AUTHORIZED_MESSAGE)
    }

    /// Convenience constructor for [`FailureKind::Connectivity`].
    pub fn connectivity() -> Self {
        Self::new(FailureKind::Connectivity, CONNECTIVITY_MESSAGE)
    }

    /// Convenience constructor for [`FailureKind::Cancelled`].
    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, CANCELLED_MESSAGE)
    }

    /// Convenience constructor for [`FailureKind::Unexpected`].
    pub fn unexpected() -> Self {
        Self::new(FailureKind::Unexpected, UNEXPECTED_MESSAGE)
    }

    /// Convenience constructor for [`FailureKind::InvalidResponse`].
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidResponse, message)
    }

    /// Convenience constructor for [`FailureKind::Client`].
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Client, message)
    }

    /// Build a [`FailureKind::Validation`] error from per-field messages.
    pub fn validation(errors: &FieldErrors) -> Self {
        Self::new(FailureKind::Validation, VALIDATION_MESSAGE).with_details(errors.to_value())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorDto {
    code: FailureKind,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<ApiError> for ApiErrorDto {
    fn from(value: ApiError) -> Self {
        Self {
            code: value.kind,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ApiErrorDto> for ApiError {
    type Error = ApiErrorValidationError;

    fn try_from(value: ApiErrorDto) -> Result<Self, Self::Error> {
        let ApiErrorDto {
            code,
            message,
            details,
        } = value;
        let mut error = ApiError::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}

/// Convenient access-layer result alias.
pub type ApiResult<T> = Result<T, ApiError>;

/// Per-field validation messages collected before a request is sent.
///
/// Field names are the record's wire names (`email`, `rePassword`, …).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Empty set of field errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether no field failed validation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `Ok(())` when empty, otherwise the collected errors.
    pub fn check(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Return `Ok(())` when empty, otherwise a validation [`ApiError`].
    pub fn into_result(self) -> ApiResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(&self))
        }
    }

    fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(field, message)| ((*field).to_owned(), Value::String(message.clone())))
                .collect(),
        )
    }
}
