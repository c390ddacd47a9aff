//! Four-verb access layer over one named backend resource.
//!
//! Every call resolves to an [`ApiResult`]: the success body untouched, or a
//! normalised [`ApiError`]. Callers never see a binding's own failure types
//! and never need to sniff the shape of a success value to detect failure.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::ResourceBinding;
use crate::domain::resource::join_sub_path;
use crate::domain::{
    ApiError, ApiRequest, ApiResult, DeleteTarget, ErrorNormalizer, Method, ResourceName,
};

/// Shared pieces every [`ApiService`] needs; hands out per-resource services.
#[derive(Clone)]
pub struct AccessLayer {
    binding: Arc<dyn ResourceBinding>,
    normalizer: ErrorNormalizer,
}

impl AccessLayer {
    /// Combine a backend binding with the error normaliser.
    pub fn new(binding: Arc<dyn ResourceBinding>, normalizer: ErrorNormalizer) -> Self {
        Self {
            binding,
            normalizer,
        }
    }

    /// Service for `resource` on an ordinary page.
    pub fn service(&self, resource: ResourceName) -> ApiService {
        ApiService::new(resource, self.binding.clone(), self.normalizer.clone())
    }

    /// Normaliser shared by every service.
    pub fn normalizer(&self) -> &ErrorNormalizer {
        &self.normalizer
    }
}

impl std::fmt::Debug for AccessLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLayer")
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

/// Access-layer instance bound to one resource.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use ledger_client::domain::ports::{
///     FixtureResourceBinding, InMemorySessionStorage, RecordingNavigator,
/// };
/// use ledger_client::domain::{ApiService, ErrorNormalizer, ResourceName, SessionContext};
/// use mockable::DefaultClock;
///
/// # tokio_test_block(async {
/// let session = SessionContext::new(
///     Arc::new(InMemorySessionStorage::new()),
///     Arc::new(DefaultClock),
/// );
/// let normalizer = ErrorNormalizer::new(session, Arc::new(RecordingNavigator::new()));
/// let invoices = ApiService::new(
///     ResourceName::new("Invoice").unwrap(),
///     Arc::new(FixtureResourceBinding),
///     normalizer,
/// );
/// assert_eq!(invoices.list().await.unwrap(), Vec::<serde_json::Value>::new());
/// # });
/// # fn tokio_test_block(fut: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(fut)
/// # }
/// ```
#[derive(Clone)]
pub struct ApiService {
    resource: ResourceName,
    binding: Arc<dyn ResourceBinding>,
    normalizer: ErrorNormalizer,
    is_auth_page: bool,
    cancellation: Option<CancellationToken>,
}

impl ApiService {
    /// Service for `resource` on an ordinary (non-auth) page.
    pub fn new(
        resource: ResourceName,
        binding: Arc<dyn ResourceBinding>,
        normalizer: ErrorNormalizer,
    ) -> Self {
        Self {
            resource,
            binding,
            normalizer,
            is_auth_page: false,
            cancellation: None,
        }
    }

    /// Mark the service as used by a login or signup page, where a 401 means
    /// rejected credentials rather than an expired session.
    pub fn for_auth_page(mut self) -> Self {
        self.is_auth_page = true;
        self
    }

    /// Abort in-flight calls when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Target resource.
    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Whether 401s are treated as rejected credentials.
    pub fn is_auth_page(&self) -> bool {
        self.is_auth_page
    }

    /// Read the collection, or a record or sub-resource when `sub_path` is
    /// given.
    pub async fn get(&self, sub_path: Option<&str>) -> ApiResult<Value> {
        self.request(Method::Get, sub_path.map(str::to_owned), None)
            .await
    }

    /// Read one record by id.
    pub async fn get_by_id(&self, id: &str) -> ApiResult<Value> {
        self.get(Some(id)).await
    }

    /// Read the collection and require it to be an array.
    pub async fn list(&self) -> ApiResult<Vec<Value>> {
        match self.get(None).await? {
            Value::Array(items) => Ok(items),
            other => Err(ApiError::invalid_response(format!(
                "expected a list of {} records, got {}",
                self.resource,
                json_type(&other)
            ))),
        }
    }

    /// Create a record or invoke the named action at `sub_path`.
    pub async fn post(&self, record: Value, sub_path: Option<&str>) -> ApiResult<Value> {
        self.request(Method::Post, sub_path.map(str::to_owned), Some(record))
            .await
    }

    /// Replace a record.
    pub async fn put(&self, record: Value, sub_path: Option<&str>) -> ApiResult<Value> {
        self.request(Method::Put, sub_path.map(str::to_owned), Some(record))
            .await
    }

    /// Remove a record by id, or send a removal payload.
    pub async fn delete(
        &self,
        target: impl Into<DeleteTarget>,
        sub_path: Option<&str>,
    ) -> ApiResult<Value> {
        match target.into() {
            DeleteTarget::Id(id) => {
                self.request(Method::Delete, join_sub_path(sub_path, Some(&id)), None)
                    .await
            }
            DeleteTarget::Payload(payload) => {
                self.request(Method::Delete, sub_path.map(str::to_owned), Some(payload))
                    .await
            }
        }
    }

    /// [`Self::get`] decoded into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, sub_path: Option<&str>) -> ApiResult<T> {
        decode(self.get(sub_path).await?)
    }

    /// [`Self::post`] decoded into `T`.
    pub async fn post_as<T: DeserializeOwned>(
        &self,
        record: Value,
        sub_path: Option<&str>,
    ) -> ApiResult<T> {
        decode(self.post(record, sub_path).await?)
    }

    async fn request(
        &self,
        method: Method,
        sub_path: Option<String>,
        body: Option<Value>,
    ) -> ApiResult<Value> {
        let request = ApiRequest::new(method, self.resource.clone(), sub_path.as_deref(), body);
        let request_id = Uuid::new_v4();
        debug!(%request_id, %method, path = %request.path(), "sending request");

        let outcome = match &self.cancellation {
            Some(token) => {
                if token.is_cancelled() {
                    debug!(%request_id, "request cancelled before sending");
                    return Err(ApiError::cancelled());
                }
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!(%request_id, "request cancelled in flight");
                        return Err(ApiError::cancelled());
                    }
                    outcome = self.binding.send(&request) => outcome,
                }
            }
            None => self.binding.send(&request).await,
        };

        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            debug!(%request_id, "discarding result that arrived after cancellation");
            return Err(ApiError::cancelled());
        }

        match outcome {
            Ok(value) => {
                debug!(%request_id, "request succeeded");
                Ok(value)
            }
            Err(failure) => Err(self.normalizer.normalize(&failure, self.is_auth_page)),
        }
    }
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("resource", &self.resource)
            .field("is_auth_page", &self.is_auth_page)
            .field("cancellable", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value)
        .map_err(|error| ApiError::invalid_response(format!("unexpected response shape: {error}")))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
