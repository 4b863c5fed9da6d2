use serde::Serialize;
use serde_json::Value;

use crate::response::graphql_error::ExecutionError;

/// The final result of executing a query plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutput {
    /// `None` only when nothing could be fetched at all, rendered as `"data": null`.
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExecutionError>,
}

impl ExecutionOutput {
    pub fn new(data: Value, errors: Vec<ExecutionError>) -> Self {
        let nothing_fetched = matches!(&data, Value::Object(map) if map.is_empty());
        let data = if nothing_fetched && !errors.is_empty() {
            None
        } else {
            Some(data)
        };
        ExecutionOutput { data, errors }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The response as a GraphQL response document.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
