use std::{collections::HashMap, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ServicesConfig {
    /// The default configuration applied to every service.
    #[serde(default)]
    pub all: ServiceConfig,

    /// Per-service overrides, keyed by the service name used in query plans.
    /// Fields that are not set fall back to the values in `all`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub subgraphs: HashMap<String, ServiceConfig>,
}

impl ServicesConfig {
    /// Resolves the effective configuration of a single service.
    pub fn for_service(&self, service_name: &str) -> ServiceConfig {
        match self.subgraphs.get(service_name) {
            Some(overrides) => ServiceConfig {
                timeout: overrides.timeout.or(self.all.timeout),
            },
            None => self.all.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Maximum duration of a single call to the service.
    /// A call that exceeds it fails with a `SERVICE_TIMEOUT` error for the region it owns.
    #[serde(
        default,
        deserialize_with = "humantime_serde::deserialize",
        serialize_with = "humantime_serde::serialize"
    )]
    #[schemars(with = "Option<String>")]
    pub timeout: Option<Duration>,
}
