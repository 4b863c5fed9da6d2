pub mod local;
pub mod registry;
pub mod timeout;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use http::HeaderMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::response::graphql_error::{codes, ExecutionError};

/// A downstream GraphQL service the executor can send operations to.
///
/// Implementations never fail the whole execution: transport problems are
/// reported through [`ServiceResult::fatal`] and only affect the region of the
/// response owned by the fetch.
#[async_trait]
pub trait ServiceEndpoint {
    async fn send<'a>(&self, request: ServiceRequest<'a>) -> ServiceResult;

    fn to_boxed_arc<'a>(self) -> Arc<Box<dyn ServiceEndpoint + Send + Sync + 'a>>
    where
        Self: Sized + Send + Sync + 'a,
    {
        Arc::new(Box::new(self))
    }
}

pub type ServiceEndpointType = dyn ServiceEndpoint + Send + Sync;

pub type ServiceEndpointBoxedArc = Arc<Box<ServiceEndpointType>>;

/// Data attached to the incoming request, forwarded to every service call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub headers: HeaderMap,
    pub extensions: Map<String, Value>,
}

pub struct ServiceRequest<'a> {
    pub service_name: &'a str,
    pub operation: &'a str,
    pub operation_name: Option<&'a str>,
    pub variables: Map<String, Value>,
    pub context: &'a RequestContext,
}

/// What a service returned for one call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceResult {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<ExecutionError>,
    /// Set when the call itself failed and no GraphQL response was produced.
    #[serde(skip)]
    pub fatal: Option<ServiceFailure>,
}

impl ServiceResult {
    pub fn from_data(data: Value) -> Self {
        ServiceResult {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn from_errors(errors: Vec<ExecutionError>) -> Self {
        ServiceResult {
            errors,
            ..Default::default()
        }
    }

    pub fn failure(failure: ServiceFailure) -> Self {
        ServiceResult {
            fatal: Some(failure),
            ..Default::default()
        }
    }

    /// Parses a GraphQL response document. Anything that is not one is a fatal failure.
    pub fn from_response_json(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|error| {
            ServiceResult::failure(ServiceFailure::MalformedResponse(error.to_string()))
        })
    }

    /// Separates a failed call from a GraphQL response.
    pub fn into_result(mut self) -> Result<Self, ServiceFailure> {
        match self.fatal.take() {
            Some(failure) => Err(failure),
            None => Ok(self),
        }
    }

    pub fn with_errors(mut self, errors: Vec<ExecutionError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceFailure {
    #[error("Failed to send the request: {0}")]
    RequestFailure(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Received an invalid response: {0}")]
    MalformedResponse(String),
}

impl ServiceFailure {
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceFailure::RequestFailure(_) => codes::SERVICE_REQUEST_FAILURE,
            ServiceFailure::Timeout(_) => codes::SERVICE_TIMEOUT,
            ServiceFailure::MalformedResponse(_) => codes::INVALID_SERVICE_RESPONSE,
        }
    }
}
