use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::services::{
    ServiceEndpoint, ServiceEndpointBoxedArc, ServiceFailure, ServiceRequest, ServiceResult,
};

/// Bounds the duration of every call to the wrapped endpoint.
pub struct TimeoutServiceEndpoint {
    pub service_name: String,
    pub timeout: Duration,
    pub endpoint: ServiceEndpointBoxedArc,
}

impl TimeoutServiceEndpoint {
    pub fn new(service_name: String, timeout: Duration, endpoint: ServiceEndpointBoxedArc) -> Self {
        Self {
            service_name,
            timeout,
            endpoint,
        }
    }
}

#[async_trait]
impl ServiceEndpoint for TimeoutServiceEndpoint {
    async fn send<'a>(&self, request: ServiceRequest<'a>) -> ServiceResult {
        let execution = self.endpoint.send(request);
        match tokio::time::timeout(self.timeout, execution).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Request to service \"{}\" timed out after {:?}",
                    self.service_name, self.timeout
                );
                ServiceResult::failure(ServiceFailure::Timeout(self.timeout))
            }
        }
    }
}
