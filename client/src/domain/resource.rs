//! Resource addressing: which backend collection a request targets and how.

use std::fmt;

use serde_json::Value;

/// Validation errors returned by [`ResourceName::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceNameError {
    /// The name was empty.
    #[error("resource name must not be empty")]
    Empty,
    /// A `/`-separated segment was empty, as in `a//b` or `/a`.
    #[error("resource name `{name}` has an empty path segment")]
    EmptySegment {
        /// Rejected input.
        name: String,
    },
    /// A segment contained whitespace or a character outside `[A-Za-z0-9_-]`.
    #[error("resource name `{name}` may only contain letters, digits, `-` or `_` between `/`")]
    InvalidCharacters {
        /// Rejected input.
        name: String,
    },
}

/// Name of a backend collection or controller, such as `Invoice`,
/// `contacts` or the nested `inventory/dashboard`.
///
/// ## Invariants
/// - One or more `/`-separated segments.
/// - Every segment is non-empty and made only of ASCII letters, digits,
///   `-` and `_`.
///
/// # Examples
/// ```
/// use ledger_client::domain::ResourceName;
///
/// let name = ResourceName::new("inventory/dashboard").unwrap();
/// assert_eq!(name.segments().collect::<Vec<_>>(), ["inventory", "dashboard"]);
/// assert!(ResourceName::new("inventory//dashboard").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    /// Validate and construct a resource name.
    pub fn new(name: impl Into<String>) -> Result<Self, ResourceNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ResourceNameError::Empty);
        }
        if name.split('/').any(str::is_empty) {
            return Err(ResourceNameError::EmptySegment { name });
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '/')
        {
            return Err(ResourceNameError::InvalidCharacters { name });
        }
        Ok(Self(name))
    }

    /// Path segments of the name, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Whether the name spans more than one segment.
    pub fn is_nested(&self) -> bool {
        self.0.contains('/')
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// HTTP-style verb of an access-layer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a collection or record.
    Get,
    /// Create a record or invoke a named action.
    Post,
    /// Replace a record.
    Put,
    /// Remove a record.
    Delete,
}

impl Method {
    /// Upper-case verb name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a `delete` call removes.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    /// A record id, appended to the request path.
    Id(String),
    /// A payload sent as the request body.
    Payload(Value),
}

impl From<&str> for DeleteTarget {
    fn from(value: &str) -> Self {
        Self::Id(value.to_owned())
    }
}

impl From<String> for DeleteTarget {
    fn from(value: String) -> Self {
        Self::Id(value)
    }
}

impl From<Value> for DeleteTarget {
    fn from(value: Value) -> Self {
        Self::Payload(value)
    }
}

/// A single access-layer request, independent of the binding that sends it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    resource: ResourceName,
    sub_path: Option<String>,
    body: Option<Value>,
}

impl ApiRequest {
    /// Build a request. Blank sub-paths are treated as absent and surrounding
    /// slashes are trimmed.
    pub fn new(
        method: Method,
        resource: ResourceName,
        sub_path: Option<&str>,
        body: Option<Value>,
    ) -> Self {
        Self {
            method,
            resource,
            sub_path: normalise_sub_path(sub_path),
            body,
        }
    }

    /// Request verb.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Target collection.
    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Sub-path or record id under the collection.
    pub fn sub_path(&self) -> Option<&str> {
        self.sub_path.as_deref()
    }

    /// Non-empty segments of the sub-path.
    pub fn sub_path_segments(&self) -> impl Iterator<Item = &str> {
        self.sub_path
            .as_deref()
            .into_iter()
            .flat_map(|path| path.split('/'))
            .filter(|segment| !segment.is_empty())
    }

    /// Request body.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// `resource[/sub_path]` without a leading slash.
    pub fn path(&self) -> String {
        match &self.sub_path {
            Some(sub_path) => format!("{}/{sub_path}", self.resource),
            None => self.resource.to_string(),
        }
    }
}

/// Join an optional caller sub-path with an optional trailing id.
pub(crate) fn join_sub_path(sub_path: Option<&str>, id: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [sub_path, id]
        .into_iter()
        .flatten()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.trim().is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn normalise_sub_path(sub_path: Option<&str>) -> Option<String> {
    sub_path
        .map(|path| path.trim().trim_matches('/'))
        .filter(|path| !path.is_empty())
        .map(str::to_owned)
}
