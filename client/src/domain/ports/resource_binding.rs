//! Driven port for sending access-layer requests to a backend.
//!
//! A binding performs exactly one round trip per request and reports either
//! the raw success body or a [`RequestFailure`] describing what it observed.
//! Interpreting failures is the normaliser's job, not the binding's.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ApiRequest, Method, RequestFailure};

/// Port implemented by every backend binding (REST, document store).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceBinding: Send + Sync {
    /// Send one request and return the success body untransformed.
    async fn send(&self, request: &ApiRequest) -> Result<Value, RequestFailure>;
}

/// Fixture binding that answers without any backend.
///
/// Collection reads return an empty array, record reads return `null`, and
/// writes echo their body back.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureResourceBinding;

#[async_trait]
impl ResourceBinding for FixtureResourceBinding {
    async fn send(&self, request: &ApiRequest) -> Result<Value, RequestFailure> {
        Ok(match (request.method(), request.sub_path()) {
            (Method::Get, None) => Value::Array(Vec::new()),
            (Method::Get, Some(_)) => Value::Null,
            _ => request.body().cloned().unwrap_or(Value::Null),
        })
    }
}
