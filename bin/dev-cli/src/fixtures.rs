use std::{collections::HashMap, sync::Arc};

use hive_plan_executor::{
    response::graphql_error::ExecutionError,
    services::{
        local::{LocalRequest, LocalServiceEndpoint},
        ServiceEndpoint, ServiceEndpointBoxedArc, ServiceResult,
    },
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// The canned responses of one service.
///
/// Regular operations receive `data` as is. Entity calls receive, for every
/// representation, the first of `entities` that has all the fields of the
/// representation, or `null` when none matches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceFixture {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<ExecutionError>,
}

pub type ServiceFixtures = HashMap<String, ServiceFixture>;

impl ServiceFixture {
    pub fn respond(&self, request: &LocalRequest) -> ServiceResult {
        let result = if request.variables.contains_key("representations") {
            let entities: Vec<Value> = request
                .representations()
                .iter()
                .map(|representation| self.resolve_entity(representation))
                .collect();
            ServiceResult::from_data(serde_json::json!({ "_entities": entities }))
        } else {
            ServiceResult {
                data: self.data.clone(),
                ..Default::default()
            }
        };
        result.with_errors(self.errors.clone())
    }

    fn resolve_entity(&self, representation: &Value) -> Value {
        let Some(fields) = representation.as_object() else {
            return Value::Null;
        };
        self.entities
            .iter()
            .find(|entity| {
                fields
                    .iter()
                    .all(|(key, value)| entity.get(key) == Some(value))
            })
            .cloned()
            .unwrap_or(Value::Null)
    }
}

pub fn into_endpoints(fixtures: ServiceFixtures) -> Vec<(String, ServiceEndpointBoxedArc)> {
    fixtures
        .into_iter()
        .map(|(service_name, fixture)| {
            let fixture = Arc::new(fixture);
            let endpoint = LocalServiceEndpoint::new(move |request: LocalRequest| {
                let fixture = fixture.clone();
                async move {
                    debug!(
                        "Fixture service \"{}\" received {}",
                        request.service_name, request.operation
                    );
                    fixture.respond(&request)
                }
            });
            (service_name, endpoint.to_boxed_arc())
        })
        .collect()
}
