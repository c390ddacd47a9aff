//! Turns binding failures into one [`ApiError`] and enforces the forced
//! logout that follows an authentication failure.
//!
//! The checks run in a fixed priority order and the first match wins:
//!
//! 1. A 401 outside an auth page ends the session.
//! 2. A body with a truthy `message` field supplies the message.
//! 3. Any other truthy body becomes the message.
//! 4. A non-empty status text becomes the message.
//! 5. A 401 on an auth page reports the credentials as rejected.
//! 6. The failure's own message is used, with transport failures and bare
//!    status failures replaced by friendlier wording.
//! 7. Otherwise a generic message.
//!
//! Reordering the checks changes what users see.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::failure::value_to_message;
use crate::domain::ports::{LOGIN_ROUTE, Navigator};
use crate::domain::{
    ApiError, FailureKind, NETWORK_ERROR_MARKER, REQUEST_FAILED_MESSAGE, REQUEST_FAILED_PREFIX,
    RequestFailure, ResponseBody, SessionContext,
};

/// Result of classifying a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Error handed back to the caller.
    pub error: ApiError,
    /// Whether the session must be cleared and the user sent to log in.
    pub force_logout: bool,
}

impl Normalized {
    fn plain(error: ApiError) -> Self {
        Self {
            error,
            force_logout: false,
        }
    }
}

/// Classify `failure` without side effects.
///
/// # Examples
/// ```
/// use ledger_client::domain::{
///     FailedResponse, FailureKind, RequestFailure, ResponseBody, classify,
/// };
/// use serde_json::json;
///
/// let failure = RequestFailure::from_response(FailedResponse::new(
///     409,
///     None,
///     ResponseBody::Json(json!({"message": "Invoice number already used"})),
/// ));
/// let normalized = classify(&failure, false);
/// assert_eq!(normalized.error.kind(), FailureKind::Server);
/// assert_eq!(normalized.error.message(), "Invoice number already used");
/// assert!(!normalized.force_logout);
/// ```
pub fn classify(failure: &RequestFailure, is_auth_page: bool) -> Normalized {
    if let Some(response) = failure.response() {
        if response.is_unauthorized() && !is_auth_page {
            return Normalized {
                error: ApiError::session_expired(),
                force_logout: true,
            };
        }
        if let Some(message) = response.body.message_field() {
            let mut error = ApiError::new(FailureKind::Server, value_to_message(message));
            if let ResponseBody::Json(body) = &response.body {
                error = error.with_details(body.clone());
            }
            return Normalized::plain(error);
        }
        if let Some(message) = response
            .body
            .as_message()
            .filter(|_| response.body.is_present())
        {
            return Normalized::plain(ApiError::new(FailureKind::Server, message));
        }
        if let Some(status_text) = response.status_text() {
            return Normalized::plain(ApiError::new(FailureKind::Request, status_text));
        }
        if response.is_unauthorized() {
            return Normalized::plain(ApiError::not_authorized());
        }
    }

    if let Some(message) = failure.message() {
        if message.contains(NETWORK_ERROR_MARKER) {
            return Normalized::plain(ApiError::connectivity());
        }
        if message.contains(REQUEST_FAILED_PREFIX) {
            let nested = failure
                .response()
                .and_then(|response| response.body.message_field())
                .map(value_to_message);
            return Normalized::plain(ApiError::new(
                FailureKind::Request,
                nested.unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_owned()),
            ));
        }
        return Normalized::plain(ApiError::new(FailureKind::Client, message));
    }

    Normalized::plain(ApiError::unexpected())
}

/// Applies [`classify`] and carries out the forced logout it may demand.
#[derive(Clone)]
pub struct ErrorNormalizer {
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
}

impl ErrorNormalizer {
    /// Build a normaliser over the shared session and a navigator.
    pub fn new(session: SessionContext, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }

    /// Session context cleared on forced logout.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Normalise `failure`, clearing the session and redirecting to the
    /// login route when a 401 arrives outside an auth page.
    pub fn normalize(&self, failure: &RequestFailure, is_auth_page: bool) -> ApiError {
        let Normalized {
            error,
            force_logout,
        } = classify(failure, is_auth_page);
        let status = failure.response().map(|response| response.status);
        warn!(
            ?status,
            kind = ?error.kind(),
            failure = %failure,
            message = error.message(),
            "request failed"
        );
        if force_logout {
            info!(route = LOGIN_ROUTE, "authentication expired; forcing logout");
            self.session.force_clear();
            self.navigator.navigate(LOGIN_ROUTE);
        }
        error
    }
}

impl std::fmt::Debug for ErrorNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorNormalizer")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
