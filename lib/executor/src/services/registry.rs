use std::collections::HashMap;

use hive_plan_executor_config::services::ServicesConfig;

use crate::services::{timeout::TimeoutServiceEndpoint, ServiceEndpoint, ServiceEndpointBoxedArc};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceRegistryError {
    #[error("Service \"{0}\" is not registered")]
    NotFound(String),
}

/// Resolves the service names used in query plans to endpoints.
pub struct ServiceRegistry {
    inner: HashMap<String, ServiceEndpointBoxedArc>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        ServiceRegistry {
            inner: HashMap::new(),
        }
    }

    /// Builds a registry from endpoints, wrapping every service that has a
    /// configured timeout.
    pub fn from_config(
        config: &ServicesConfig,
        endpoints: impl IntoIterator<Item = (String, ServiceEndpointBoxedArc)>,
    ) -> Self {
        let inner = endpoints
            .into_iter()
            .map(|(service_name, endpoint)| {
                let endpoint = match config.for_service(&service_name).timeout {
                    Some(timeout) => {
                        TimeoutServiceEndpoint::new(service_name.clone(), timeout, endpoint)
                            .to_boxed_arc()
                    }
                    None => endpoint,
                };
                (service_name, endpoint)
            })
            .collect::<HashMap<_, _>>();
        ServiceRegistry { inner }
    }

    pub fn insert<E>(&mut self, service_name: impl Into<String>, endpoint: E)
    where
        E: ServiceEndpoint + Send + Sync + 'static,
    {
        self.insert_boxed_arc(service_name.into(), endpoint.to_boxed_arc());
    }

    pub fn insert_boxed_arc(&mut self, service_name: String, boxed_arc: ServiceEndpointBoxedArc) {
        self.inner.insert(service_name, boxed_arc);
    }

    pub fn lookup(
        &self,
        service_name: &str,
    ) -> Result<&ServiceEndpointBoxedArc, ServiceRegistryError> {
        self.inner
            .get(service_name)
            .ok_or_else(|| ServiceRegistryError::NotFound(service_name.to_string()))
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.inner.contains_key(service_name)
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}
