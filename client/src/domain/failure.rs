//! Raw failure shapes handed from bindings to the error normaliser.
//!
//! Bindings report what they observed without interpreting it: an HTTP error
//! response (with or without a body), a transport failure, or a client-side
//! exception. [`crate::domain::error_normalizer`] turns these into one
//! [`crate::domain::ApiError`].

use serde_json::Value;

/// Marker carried by transport failures; the normaliser keys on it.
pub const NETWORK_ERROR_MARKER: &str = "Network Error";
/// Prefix of the message attached to every HTTP error response.
pub const REQUEST_FAILED_PREFIX: &str = "Request failed with status code";

/// Body of a failed HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No body bytes at all.
    Empty,
    /// A body that parsed as JSON.
    Json(Value),
    /// A body that was not valid JSON.
    Text(String),
}

impl ResponseBody {
    /// Classify raw body bytes: empty, JSON, or lossy UTF-8 text.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// The `message` field of a JSON object body, when truthy.
    pub fn message_field(&self) -> Option<&Value> {
        match self {
            Self::Json(Value::Object(map)) => map.get("message").filter(|value| is_truthy(value)),
            _ => None,
        }
    }

    /// Whether the body carries anything (empty strings and JSON falsy
    /// values count as absent).
    pub fn is_present(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Json(value) => is_truthy(value),
            Self::Text(text) => !text.is_empty(),
        }
    }

    /// Render the body as a single message string.
    pub fn as_message(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(text.clone()),
            Self::Json(value) => Some(value_to_message(value)),
        }
    }
}

/// A non-2xx response observed by a binding.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase, when the transport exposed one.
    pub status_text: Option<String>,
    /// Response body.
    pub body: ResponseBody,
}

impl FailedResponse {
    /// Build a failed response description.
    pub fn new(status: u16, status_text: Option<String>, body: ResponseBody) -> Self {
        Self {
            status,
            status_text,
            body,
        }
    }

    /// Whether the server reported an authentication failure.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Status text when non-empty.
    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Everything a binding knows about a failed request.
///
/// Mirrors the loosely-typed failures of a browser HTTP client: there may be
/// a response, a message, both, or neither.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFailure {
    response: Option<FailedResponse>,
    message: Option<String>,
}

impl RequestFailure {
    /// An HTTP error response; the message follows the usual
    /// `Request failed with status code N` wording.
    pub fn from_response(response: FailedResponse) -> Self {
        let message = format!("{REQUEST_FAILED_PREFIX} {}", response.status);
        Self {
            response: Some(response),
            message: Some(message),
        }
    }

    /// A transport failure where no response arrived.
    pub fn network(detail: impl AsRef<str>) -> Self {
        let detail = detail.as_ref();
        let message = if detail.is_empty() {
            NETWORK_ERROR_MARKER.to_owned()
        } else {
            format!("{NETWORK_ERROR_MARKER}: {detail}")
        };
        Self {
            response: None,
            message: Some(message),
        }
    }

    /// A client-side exception with a message.
    pub fn exception(message: impl Into<String>) -> Self {
        Self {
            response: None,
            message: Some(message.into()),
        }
    }

    /// A failure carrying no information.
    pub fn opaque() -> Self {
        Self {
            response: None,
            message: None,
        }
    }

    /// The failed response, if one arrived.
    pub fn response(&self) -> Option<&FailedResponse> {
        self.response.as_ref()
    }

    /// The failure message when non-empty.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|message| !message.is_empty())
    }
}

impl std::fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.message(), self.response.as_ref()) {
            (Some(message), _) => f.write_str(message),
            (None, Some(response)) => write!(f, "status {}", response.status),
            (None, None) => f.write_str("unknown failure"),
        }
    }
}

/// JavaScript-style truthiness for JSON values.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value as message text: strings verbatim, everything else as
/// compact JSON.
pub fn value_to_message(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
