use serde_json::{Map, Value};

use crate::{
    plan::{InlineFragmentSelection, RequiresSelection},
    response::merge::deep_merge_objects,
};

/// Builds the representation of an entity found in the response, keeping only
/// the fields listed in `requires`.
///
/// Returns `None` when the entity cannot be represented: it is null, a field it
/// requires is missing or null, or none of the type conditions match it.
pub fn project_requires(requires: &[RequiresSelection], entity: &Value) -> Option<Value> {
    match entity {
        Value::Object(entity_map) => project_object(requires, entity_map).map(Value::Object),
        _ => None,
    }
}

fn project_object(
    selections: &[RequiresSelection],
    entity: &Map<String, Value>,
) -> Option<Map<String, Value>> {
    let mut representation = Map::new();

    for selection in selections {
        match selection {
            RequiresSelection::Field(field) => {
                let response_key = field.response_key();
                let value = entity.get(response_key).filter(|value| !value.is_null())?;
                let projected = match field.selections.as_deref() {
                    Some(selections) if !selections.is_empty() => {
                        project_value(selections, value)?
                    }
                    _ => value.clone(),
                };
                representation.insert(response_key.to_string(), projected);
            }
            RequiresSelection::InlineFragment(fragment) => {
                if !fragment_applies(fragment, entity) {
                    continue;
                }
                let projected = project_object(&fragment.selections, entity)?;
                deep_merge_objects(&mut representation, projected);
            }
        }
    }

    if representation.is_empty() {
        None
    } else {
        Some(representation)
    }
}

fn project_value(selections: &[RequiresSelection], value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) => project_object(selections, map).map(Value::Object),
        Value::Array(items) => items
            .iter()
            .map(|item| project_value(selections, item))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        // A sub-selection on a scalar, or a null nested value.
        _ => None,
    }
}

fn fragment_applies(fragment: &InlineFragmentSelection, entity: &Map<String, Value>) -> bool {
    let Some(type_condition) = &fragment.type_condition else {
        return true;
    };
    match entity.get("__typename").and_then(Value::as_str) {
        Some(type_name) => type_name == type_condition,
        None => true,
    }
}
