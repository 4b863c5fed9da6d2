use std::{
    fmt::{self, Display},
    str::FromStr,
};

use schemars::JsonSchema;
use serde::{
    de::{value::StrDeserializer, DeserializeOwned, IntoDeserializer},
    Deserialize, Serialize,
};
use serde_json::Value;

/// The `tracing` target of the executor crate.
pub const EXECUTOR_TARGET: &str = "hive_plan_executor";

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// The level applied to every crate, unless `filter` is set.
    ///
    /// Can also be set via the `LOG_LEVEL` environment variable.
    #[serde(default)]
    pub level: LogLevel,

    /// A level for the executor alone, for example `trace` to follow every plan node
    /// and service call without the noise of the other crates.
    ///
    /// Can also be set via the `LOG_EXECUTOR_LEVEL` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_level: Option<LogLevel>,

    /// How log lines are rendered. `pretty-tree` nests spans the way plan nodes nest.
    ///
    /// Can also be set via the `LOG_FORMAT` environment variable.
    #[serde(default)]
    pub format: LogFormat,

    /// Raw `tracing` filter directives, replacing both levels when set.
    ///
    /// Can also be set via the `LOG_FILTER` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl LoggingConfig {
    /// The directives to build an `EnvFilter` from.
    pub fn filter_directives(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }
        match self.executor_level {
            Some(executor_level) => {
                format!("{},{}={}", self.level, EXECUTOR_TARGET, executor_level)
            }
            None => self.level.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    PrettyTree,
    PrettyCompact,
    Json,
}

/// Both enums are spelled in environment variables the same way as in config files,
/// so their serde names are the only source of truth.
fn parse_name<T: DeserializeOwned>(kind: &str, raw: &str) -> Result<T, String> {
    let name = raw.trim().to_ascii_lowercase();
    let deserializer: StrDeserializer<'_, serde::de::value::Error> =
        name.as_str().into_deserializer();
    T::deserialize(deserializer).map_err(|_| format!("Unknown log {}: \"{}\"", kind, raw))
}

fn write_name<T: Serialize>(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match serde_json::to_value(value) {
        Ok(Value::String(name)) => f.write_str(&name),
        _ => Err(fmt::Error),
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_name("level", s)
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_name(self, f)
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_name("format", s)
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_name(self, f)
    }
}
