use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Deadline for executing a whole query plan (for example `30s` or `1500ms`).
    ///
    /// When the deadline expires, in-flight service calls are abandoned and every
    /// region of the response that did not complete is reported with an
    /// `EXECUTION_TIMEOUT` error. Data produced before the deadline is kept.
    ///
    /// Can also be set via the `EXECUTION_TIMEOUT` environment variable.
    #[serde(
        default,
        deserialize_with = "humantime_serde::deserialize",
        serialize_with = "humantime_serde::serialize"
    )]
    #[schemars(with = "Option<String>")]
    pub timeout: Option<Duration>,
}
