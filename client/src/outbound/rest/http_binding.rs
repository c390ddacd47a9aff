//! Reqwest-backed REST binding.
//!
//! This adapter owns transport details only: URL construction, headers,
//! JSON bodies and translating responses into success values or
//! [`RequestFailure`]s. It never interprets a failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::ResourceBinding;
use crate::domain::{
    ApiRequest, CredentialSlot, FailedResponse, Method, RequestFailure, ResponseBody,
};

const DEFAULT_USER_AGENT: &str = concat!("ledger-client/", env!("CARGO_PKG_VERSION"));

/// Binding that sends each request to `{base_url}/{resource}[/{sub_path}]`.
#[derive(Debug, Clone)]
pub struct RestBinding {
    client: Client,
    base_url: Url,
    credentials: CredentialSlot,
}

impl RestBinding {
    /// Build a binding that relies on the transport's default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, credentials: CredentialSlot) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, credentials, None)
    }

    /// Build a binding with an optional whole-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        base_url: Url,
        credentials: CredentialSlot,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
            credentials,
        })
    }

    /// Absolute URL for `request`. Each path segment is percent-encoded.
    pub fn request_url(&self, request: &ApiRequest) -> Result<Url, RequestFailure> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                RequestFailure::exception(format!(
                    "base URL `{}` cannot carry a path",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty();
            segments.extend(request.resource().segments());
            segments.extend(request.sub_path_segments());
        }
        Ok(url)
    }
}

#[async_trait]
impl ResourceBinding for RestBinding {
    async fn send(&self, request: &ApiRequest) -> Result<Value, RequestFailure> {
        let url = self.request_url(request)?;
        debug!(method = %request.method(), %url, "sending REST request");

        let mut builder = self
            .client
            .request(reqwest_method(request.method()), url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = self.credentials.current() {
            builder = builder.header(header::AUTHORIZATION, token.authorization_value());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_failure(status, body.as_ref()));
        }
        Ok(success_body(body.as_ref()))
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn success_body(body: &[u8]) -> Value {
    match ResponseBody::from_bytes(body) {
        ResponseBody::Empty => Value::Null,
        ResponseBody::Json(value) => value,
        ResponseBody::Text(text) => Value::String(text),
    }
}

fn map_status_failure(status: StatusCode, body: &[u8]) -> RequestFailure {
    RequestFailure::from_response(FailedResponse::new(
        status.as_u16(),
        status.canonical_reason().map(str::to_owned),
        ResponseBody::from_bytes(body),
    ))
}

fn map_transport_error(error: reqwest::Error) -> RequestFailure {
    if error.is_timeout() {
        RequestFailure::exception(format!("Request timed out: {error}"))
    } else if error.is_builder() {
        RequestFailure::exception(error.to_string())
    } else {
        RequestFailure::network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network REST helpers.

    use super::*;
    use crate::domain::ResourceName;
    use rstest::rstest;
    use serde_json::json;

    fn binding(base: &str) -> RestBinding {
        RestBinding::new(Url::parse(base).expect("base url"), CredentialSlot::new())
            .expect("client builds")
    }

    fn request(sub_path: Option<&str>) -> ApiRequest {
        request_for("Invoice", sub_path)
    }

    fn request_for(resource: &str, sub_path: Option<&str>) -> ApiRequest {
        let resource = ResourceName::new(resource).expect("valid name");
        ApiRequest::new(Method::Get, resource, sub_path, None)
    }

    #[rstest]
    #[case("https://ledger.example/api", None, "https://ledger.example/api/Invoice")]
    #[case("https://ledger.example/api/", Some("42"), "https://ledger.example/api/Invoice/42")]
    #[case(
        "https://ledger.example/api",
        Some("asset/9"),
        "https://ledger.example/api/Invoice/asset/9"
    )]
    #[case(
        "https://ledger.example/api",
        Some("a b?c"),
        "https://ledger.example/api/Invoice/a%20b%3Fc"
    )]
    fn builds_resource_urls(
        #[case] base: &str,
        #[case] sub_path: Option<&str>,
        #[case] expected: &str,
    ) {
        let url = binding(base)
            .request_url(&request(sub_path))
            .expect("url builds");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case(None, "https://ledger.example/api/inventory/dashboard")]
    #[case(Some("7"), "https://ledger.example/api/inventory/dashboard/7")]
    fn nested_resources_keep_their_segments(
        #[case] sub_path: Option<&str>,
        #[case] expected: &str,
    ) {
        let url = binding("https://ledger.example/api/")
            .request_url(&request_for("inventory/dashboard", sub_path))
            .expect("url builds");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn rejects_bases_that_cannot_carry_paths() {
        let failure = binding("mailto:ops@ledger.example")
            .request_url(&request(None))
            .expect_err("mailto has no path");
        assert!(failure.response().is_none());
    }

    #[rstest]
    #[case(b"".as_slice(), Value::Null)]
    #[case(b"[1,2]".as_slice(), json!([1, 2]))]
    #[case(b"ok".as_slice(), json!("ok"))]
    fn decodes_success_bodies(#[case] body: &[u8], #[case] expected: Value) {
        assert_eq!(success_body(body), expected);
    }

    #[test]
    fn status_failures_carry_reason_and_body() {
        let failure = map_status_failure(StatusCode::CONFLICT, br#"{"message":"dup"}"#);
        let response = failure.response().expect("response");
        assert_eq!(response.status, 409);
        assert_eq!(response.status_text(), Some("Conflict"));
        assert_eq!(response.body, ResponseBody::Json(json!({"message": "dup"})));
        assert_eq!(failure.message(), Some("Request failed with status code 409"));
    }
}
