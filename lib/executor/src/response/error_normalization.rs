use crate::{
    plan::FlattenNodePath,
    response::graphql_error::{codes, ExecutionError, ResponsePathSegment},
};

/**
 * Map `[_entities, 0, field]` to the position the representation was built from.
 *
 * For example if the error location is `[_entities, 1, name]`
 * and the second representation came from `products.3.author`,
 * the error path becomes `["products", 3, "author", "name"]`.
 *
 * Errors that do not point into `_entities` (or point to an unknown index) are
 * located at the fields of the flatten path that come before its first list.
 */
pub fn normalize_errors_for_representations(
    service_name: &str,
    flatten_path: &FlattenNodePath,
    entity_positions: &[Vec<ResponsePathSegment>],
    errors: Vec<ExecutionError>,
) -> Vec<ExecutionError> {
    errors
        .into_iter()
        .map(|mut error| {
            let real_path = match error.path.as_deref() {
                Some(
                    [ResponsePathSegment::Field(first), ResponsePathSegment::Index(index), rest @ ..],
                ) if first == "_entities" => entity_positions.get(*index).map(|position| {
                    let mut real_path = Vec::with_capacity(position.len() + rest.len());
                    real_path.extend_from_slice(position);
                    real_path.extend_from_slice(rest);
                    real_path
                }),
                _ => None,
            };

            match real_path {
                Some(real_path) => error.path = Some(real_path),
                None => error = locate_at_flatten_path(error, flatten_path),
            }

            error.with_service_info(service_name, codes::DOWNSTREAM_SERVICE_ERROR)
        })
        .collect()
}

/// Uses the path without indexes, for errors that cannot be tied to a single entity.
pub fn locate_at_flatten_path(
    mut error: ExecutionError,
    flatten_path: &FlattenNodePath,
) -> ExecutionError {
    let real_path: Vec<ResponsePathSegment> = flatten_path
        .fields_before_first_list()
        .map(|name| ResponsePathSegment::Field(name.to_string()))
        .collect();
    error.path = if real_path.is_empty() {
        None
    } else {
        Some(real_path)
    };
    error
}

/// Errors of a root fetch already carry response paths, they only get tagged with the service.
pub fn normalize_root_errors(
    service_name: &str,
    errors: Vec<ExecutionError>,
) -> Vec<ExecutionError> {
    errors
        .into_iter()
        .map(|error| error.with_service_info(service_name, codes::DOWNSTREAM_SERVICE_ERROR))
        .collect()
}
