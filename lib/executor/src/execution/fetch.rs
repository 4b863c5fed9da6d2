use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::{
    execution::{
        cancellation::CancellationError, context::ExecutionContext,
        representations::project_requires,
    },
    plan::{FetchNode, FlattenNodePath, FlattenNodePathSegment, RequiresSelection, VariableUsage},
    response::{
        error_normalization::{
            locate_at_flatten_path, normalize_errors_for_representations, normalize_root_errors,
        },
        graphql_error::{codes, ExecutionError, ResponsePathSegment},
        merge::deep_merge,
        tree::{collect_positions, value_at_path_mut},
    },
    services::{registry::ServiceRegistryError, ServiceFailure, ServiceRequest, ServiceResult},
};

/// Why a fetch could not produce a usable service response.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error(transparent)]
    ServiceNotFound(#[from] ServiceRegistryError),
    #[error("Request to service \"{0}\" failed: {1}")]
    Service(String, ServiceFailure),
    #[error("Service \"{0}\" returned an invalid entities list: {1}")]
    InvalidEntities(String, String),
    #[error("{1} before service \"{0}\" responded")]
    Cancelled(String, CancellationError),
}

impl FetchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::ServiceNotFound(_) => codes::SERVICE_NOT_FOUND,
            FetchError::Service(_, failure) => failure.error_code(),
            FetchError::InvalidEntities(..) => codes::INVALID_SERVICE_RESPONSE,
            FetchError::Cancelled(_, reason) => reason.error_code(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, FetchError::Cancelled(..))
    }

    pub fn into_execution_error(
        self,
        service_name: &str,
        path: Option<Vec<ResponsePathSegment>>,
    ) -> ExecutionError {
        let code = self.error_code();
        let mut error = ExecutionError::from(self.to_string())
            .with_code(code)
            .with_extension("serviceName", service_name.into());
        error.path = path;
        error
    }
}

/// Executes a fetch that writes at the root of the response.
///
/// The fetch owns the top-level fields selected by its operation. When it fails,
/// those fields are set to `null` unless another fetch already wrote them.
#[instrument(level = "trace", skip_all, name = "FetchNode::execute", fields(
    service_name = %fetch.service_name,
))]
pub async fn execute_root_fetch(ctx: &ExecutionContext<'_>, fetch: &FetchNode) {
    let variables = collect_variables(ctx, fetch);

    let result = match send_request(ctx, fetch, variables).await {
        Ok(result) => result,
        Err(error) => {
            let root_keys = fetch.root_response_keys();
            if !error.is_cancellation() {
                ctx.response.null_missing_root_keys(&root_keys);
            }
            warn!("{}", error);
            let path = match root_keys.as_slice() {
                [key] => Some(vec![ResponsePathSegment::Field(key.clone())]),
                _ => None,
            };
            ctx.push_error(error.into_execution_error(&fetch.service_name, path));
            return;
        }
    };

    let errors = normalize_root_errors(&fetch.service_name, result.errors);
    match result.data {
        Some(data @ Value::Object(_)) => ctx.response.merge_at(&[], data),
        Some(Value::Null) | None => {
            ctx.response.null_missing_root_keys(&fetch.root_response_keys());
        }
        Some(_) => {
            let root_keys = fetch.root_response_keys();
            ctx.response.null_missing_root_keys(&root_keys);
            let error = FetchError::Service(
                fetch.service_name.clone(),
                ServiceFailure::MalformedResponse("data is not an object".to_string()),
            );
            warn!("{}", error);
            ctx.push_error(error.into_execution_error(&fetch.service_name, None));
        }
    }
    ctx.extend_errors(errors);
}

/// Executes an entity fetch for every entity found at `path`.
///
/// All representations of the region are sent in a single call, in the order
/// the entities appear in the response. The i-th entity returned by the service
/// is merged into the i-th position.
#[instrument(level = "trace", skip_all, name = "FlattenNode::execute", fields(
    path = %path,
    service_name = %fetch.service_name,
))]
pub async fn execute_entity_fetch(
    ctx: &ExecutionContext<'_>,
    path: &FlattenNodePath,
    fetch: &FetchNode,
    requires: &[RequiresSelection],
) {
    let service_name = fetch.service_name.as_str();

    let (positions, representations): (Vec<Vec<ResponsePathSegment>>, Vec<Value>) =
        ctx.response.read(|root| {
            collect_positions(root, path.as_slice())
                .into_iter()
                .filter_map(|(position, entity)| {
                    project_requires(requires, entity)
                        .map(|representation| (position, representation))
                })
                .unzip()
        });

    if representations.is_empty() {
        debug!(
            "No entities to resolve at \"{}\", skipping the call to service \"{}\"",
            path, service_name
        );
        return;
    }

    let mut variables = collect_variables(ctx, fetch);
    variables.insert("representations".to_string(), Value::Array(representations));

    let result = match send_request(ctx, fetch, variables).await {
        Ok(result) => result,
        Err(error) => {
            if !error.is_cancellation() {
                null_positions(ctx, &positions);
            }
            warn!("{}", error);
            let error = error.into_execution_error(service_name, None);
            ctx.push_error(locate_at_flatten_path(error, path));
            return;
        }
    };

    let errors =
        normalize_errors_for_representations(service_name, path, &positions, result.errors);

    match entities_from_data(result.data, positions.len()) {
        Ok(entities) => {
            let invalid_entities = ctx.response.write(|root| {
                let mut invalid_entities = Vec::new();
                for (index, (position, entity)) in positions.iter().zip(entities).enumerate() {
                    let Some(target) = value_at_path_mut(root, position) else {
                        continue;
                    };
                    match entity {
                        Value::Null => *target = Value::Null,
                        entity @ Value::Object(_) => deep_merge(target, entity),
                        _ => {
                            *target = Value::Null;
                            invalid_entities.push((index, position));
                        }
                    }
                }
                invalid_entities
            });

            for (index, position) in invalid_entities {
                let error = FetchError::InvalidEntities(
                    service_name.to_string(),
                    EntitiesError::NotAnObject { index }.to_string(),
                );
                warn!("{}", error);
                ctx.push_error(error.into_execution_error(service_name, Some(position.clone())));
            }
        }
        Err(EntitiesError::Missing) if !errors.is_empty() => {
            null_positions(ctx, &positions);
        }
        Err(reason) => {
            null_positions(ctx, &positions);
            let error = FetchError::InvalidEntities(service_name.to_string(), reason.to_string());
            warn!("{}", error);
            let error = error.into_execution_error(service_name, None);
            ctx.push_error(locate_at_flatten_path(error, path));
        }
    }
    ctx.extend_errors(errors);
}

#[derive(Debug, thiserror::Error)]
enum EntitiesError {
    #[error("`_entities` is missing")]
    Missing,
    #[error("`_entities` is not a list")]
    NotAList,
    #[error("expected {expected} entities, received {received}")]
    LengthMismatch { expected: usize, received: usize },
    #[error("entity {index} is not an object")]
    NotAnObject { index: usize },
}

fn entities_from_data(data: Option<Value>, expected: usize) -> Result<Vec<Value>, EntitiesError> {
    let entities = match data {
        Some(Value::Object(mut data)) => data.remove("_entities"),
        _ => None,
    };
    match entities {
        Some(Value::Array(entities)) if entities.len() == expected => Ok(entities),
        Some(Value::Array(entities)) => Err(EntitiesError::LengthMismatch {
            expected,
            received: entities.len(),
        }),
        Some(Value::Null) | None => Err(EntitiesError::Missing),
        Some(_) => Err(EntitiesError::NotAList),
    }
}

fn null_positions(ctx: &ExecutionContext<'_>, positions: &[Vec<ResponsePathSegment>]) {
    ctx.response.write(|root| {
        for position in positions {
            if let Some(target) = value_at_path_mut(root, position) {
                *target = Value::Null;
            }
        }
    });
}

/// Sends the operation of `fetch` to its service, racing the call against the
/// cancellation of the execution. A cancelled call is dropped.
async fn send_request(
    ctx: &ExecutionContext<'_>,
    fetch: &FetchNode,
    variables: Map<String, Value>,
) -> Result<ServiceResult, FetchError> {
    let service_name = fetch.service_name.as_str();
    let endpoint = ctx.registry.lookup(service_name)?;
    ctx.cancellation
        .bail_if_cancelled()
        .map_err(|reason| FetchError::Cancelled(service_name.to_string(), reason))?;

    debug!(
        "Sending operation {} to service \"{}\" with {} variables",
        fetch.operation_name.as_deref().unwrap_or("<anonymous>"),
        service_name,
        variables.len()
    );

    let request = ServiceRequest {
        service_name,
        operation: &fetch.operation,
        operation_name: fetch.operation_name.as_deref(),
        variables,
        context: ctx.request_context,
    };

    tokio::select! {
        biased;
        reason = ctx.cancellation.cancelled() => {
            Err(FetchError::Cancelled(service_name.to_string(), reason))
        }
        result = endpoint.send(request) => {
            result
                .into_result()
                .map_err(|failure| FetchError::Service(service_name.to_string(), failure))
        }
    }
}

/// Resolves the variables the fetch declares. Variables without a value are omitted.
fn collect_variables(ctx: &ExecutionContext<'_>, fetch: &FetchNode) -> Map<String, Value> {
    let mut variables = Map::new();
    for usage in &fetch.variable_usages {
        let value = match usage {
            VariableUsage::Variable(name) => ctx.variables.get(name).cloned(),
            VariableUsage::Response { path, .. } => {
                ctx.response.read(|root| value_from_response(root, path))
            }
        };
        if let Some(value) = value {
            variables.insert(usage.name().to_string(), value);
        }
    }
    variables
}

/// Reads a value written by a previous step. Paths going through lists produce
/// the list of non-null values found, in order.
fn value_from_response(root: &Value, path: &FlattenNodePath) -> Option<Value> {
    let goes_through_lists = path
        .as_slice()
        .iter()
        .any(|segment| matches!(segment, FlattenNodePathSegment::List));

    if goes_through_lists {
        let values = collect_positions(root, path.as_slice())
            .into_iter()
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
            .cloned()
            .collect();
        return Some(Value::Array(values));
    }

    path.as_slice()
        .iter()
        .try_fold(root, |current, segment| match segment {
            FlattenNodePathSegment::Field(name) => current.get(name),
            FlattenNodePathSegment::List => None,
        })
        .cloned()
}
