use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display};

/// Error codes attached to `extensions.code` by the executor.
pub mod codes {
    pub const DOWNSTREAM_SERVICE_ERROR: &str = "DOWNSTREAM_SERVICE_ERROR";
    pub const SERVICE_NOT_FOUND: &str = "SERVICE_NOT_FOUND";
    pub const SERVICE_REQUEST_FAILURE: &str = "SERVICE_REQUEST_FAILURE";
    pub const SERVICE_TIMEOUT: &str = "SERVICE_TIMEOUT";
    pub const INVALID_SERVICE_RESPONSE: &str = "INVALID_SERVICE_RESPONSE";
    pub const INVALID_QUERY_PLAN: &str = "INVALID_QUERY_PLAN";
    pub const EXECUTION_CANCELLED: &str = "EXECUTION_CANCELLED";
    pub const EXECUTION_TIMEOUT: &str = "EXECUTION_TIMEOUT";
}

/// An error attached to the response, either reported by a service or produced
/// by the executor. Services report errors with the same shape.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExecutionError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<ErrorLocation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<ResponsePathSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl From<String> for ExecutionError {
    fn from(message: String) -> Self {
        ExecutionError {
            message,
            locations: None,
            path: None,
            extensions: None,
        }
    }
}

impl From<&str> for ExecutionError {
    fn from(message: &str) -> Self {
        message.to_string().into()
    }
}

impl ExecutionError {
    pub fn with_path(mut self, path: Vec<ResponsePathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_code(self, code: &str) -> Self {
        self.with_extension("code", Value::String(code.to_string()))
    }

    pub fn with_extension(mut self, key: &str, value: Value) -> Self {
        self.extensions
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|extensions| extensions.get("code"))
            .and_then(Value::as_str)
    }

    pub fn service_name(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|extensions| extensions.get("serviceName"))
            .and_then(Value::as_str)
    }

    /// Tags the error with the service it comes from, keeping values the service already set.
    pub fn with_service_info(mut self, service_name: &str, default_code: &str) -> Self {
        let extensions = self.extensions.get_or_insert_with(Map::new);
        if !extensions.contains_key("serviceName") {
            extensions.insert("serviceName".to_string(), service_name.into());
        }
        if !extensions.contains_key("code") {
            extensions.insert("code".to_string(), default_code.into());
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

/// A segment of a concrete location in the response, where list levels are
/// addressed by their index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ResponsePathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for ResponsePathSegment {
    fn from(value: &str) -> Self {
        ResponsePathSegment::Field(value.to_string())
    }
}

impl From<usize> for ResponsePathSegment {
    fn from(value: usize) -> Self {
        ResponsePathSegment::Index(value)
    }
}

impl Display for ResponsePathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponsePathSegment::Field(name) => write!(f, "{}", name),
            ResponsePathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Renders a response path as `topProducts.0.reviews`.
pub fn display_path(path: &[ResponsePathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

impl<'de> Deserialize<'de> for ResponsePathSegment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PathSegmentVisitor;

        impl<'de> de::Visitor<'de> for PathSegmentVisitor {
            type Value = ResponsePathSegment;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or an integer for a response path segment")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ResponsePathSegment::Field(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ResponsePathSegment::Field(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ResponsePathSegment::Index(value as usize))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value < 0 {
                    return Err(E::custom(format!(
                        "path segment must be a non-negative integer, but got {}",
                        value
                    )));
                }
                Ok(ResponsePathSegment::Index(value as usize))
            }
        }

        deserializer.deserialize_any(PathSegmentVisitor)
    }
}
