use std::future::Future;

use async_trait::async_trait;
use http::HeaderMap;
use serde_json::{Map, Value};

use crate::services::{ServiceEndpoint, ServiceRequest, ServiceResult};

/// An owned copy of a service call, handed to in-process handlers.
#[derive(Debug, Clone)]
pub struct LocalRequest {
    pub service_name: String,
    pub operation: String,
    pub operation_name: Option<String>,
    pub variables: Map<String, Value>,
    pub headers: HeaderMap,
    pub extensions: Map<String, Value>,
}

impl From<ServiceRequest<'_>> for LocalRequest {
    fn from(request: ServiceRequest<'_>) -> Self {
        LocalRequest {
            service_name: request.service_name.to_string(),
            operation: request.operation.to_string(),
            operation_name: request.operation_name.map(ToString::to_string),
            variables: request.variables,
            headers: request.context.headers.clone(),
            extensions: request.context.extensions.clone(),
        }
    }
}

impl LocalRequest {
    /// The `representations` variable of an entity fetch.
    pub fn representations(&self) -> &[Value] {
        self.variables
            .get("representations")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Serves a service from an async function running in the same process.
/// Used to compose services in tests and tools without any transport.
pub struct LocalServiceEndpoint<F> {
    handler: F,
}

impl<F, Fut> LocalServiceEndpoint<F>
where
    F: Fn(LocalRequest) -> Fut + Send + Sync,
    Fut: Future<Output = ServiceResult> + Send,
{
    pub fn new(handler: F) -> Self {
        LocalServiceEndpoint { handler }
    }
}

#[async_trait]
impl<F, Fut> ServiceEndpoint for LocalServiceEndpoint<F>
where
    F: Fn(LocalRequest) -> Fut + Send + Sync,
    Fut: Future<Output = ServiceResult> + Send,
{
    async fn send<'a>(&self, request: ServiceRequest<'a>) -> ServiceResult {
        (self.handler)(request.into()).await
    }
}
