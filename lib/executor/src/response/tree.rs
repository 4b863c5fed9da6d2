use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use crate::{
    plan::FlattenNodePathSegment,
    response::{graphql_error::ResponsePathSegment, merge::deep_merge},
};

/// The response being assembled during one execution.
///
/// Branches of the plan that run concurrently only touch the tree between two
/// service calls and always write to disjoint regions, so the lock is never
/// held across an await point and is never contended for long.
#[derive(Debug)]
pub struct ResponseTree {
    root: Mutex<Value>,
}

impl Default for ResponseTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseTree {
    pub fn new() -> Self {
        ResponseTree {
            root: Mutex::new(Value::Object(Map::new())),
        }
    }

    pub fn read<R>(&self, reader: impl FnOnce(&Value) -> R) -> R {
        let root = self.root.lock().unwrap_or_else(PoisonError::into_inner);
        reader(&root)
    }

    pub fn write<R>(&self, writer: impl FnOnce(&mut Value) -> R) -> R {
        let mut root = self.root.lock().unwrap_or_else(PoisonError::into_inner);
        writer(&mut root)
    }

    /// Merges `data` into the position addressed by `path`.
    /// Nothing is written when the position no longer exists.
    pub fn merge_at(&self, path: &[ResponsePathSegment], data: Value) {
        self.write(|root| {
            if let Some(target) = value_at_path_mut(root, path) {
                deep_merge(target, data);
            }
        })
    }

    pub fn set_null_at(&self, path: &[ResponsePathSegment]) {
        self.write(|root| {
            if let Some(target) = value_at_path_mut(root, path) {
                *target = Value::Null;
            }
        })
    }

    /// Sets the given top-level keys to `null`, unless another fetch already wrote them.
    pub fn null_missing_root_keys(&self, keys: &[String]) {
        self.write(|root| {
            if let Value::Object(map) = root {
                for key in keys {
                    map.entry(key.as_str()).or_insert(Value::Null);
                }
            }
        })
    }

    pub fn into_value(self) -> Value {
        self.root.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Walks `path` from `value` and collects every position it reaches, together with
/// its concrete location (list levels resolved to indexes), in document order.
///
/// List segments expand to every element of the list. A list reached at the end of
/// the path is expanded as well. Missing fields end the walk for that branch, so
/// positions that do not exist (yet) are simply not returned.
pub fn collect_positions<'v>(
    value: &'v Value,
    path: &[FlattenNodePathSegment],
) -> Vec<(Vec<ResponsePathSegment>, &'v Value)> {
    let mut positions = Vec::new();
    let mut current_path = Vec::new();
    collect_positions_into(value, path, &mut current_path, &mut positions);
    positions
}

fn collect_positions_into<'v>(
    value: &'v Value,
    remaining_path: &[FlattenNodePathSegment],
    current_path: &mut Vec<ResponsePathSegment>,
    positions: &mut Vec<(Vec<ResponsePathSegment>, &'v Value)>,
) {
    match (value, remaining_path) {
        (Value::Array(items), [])
        | (Value::Array(items), [FlattenNodePathSegment::List, ..])
        | (Value::Array(items), [FlattenNodePathSegment::Field(_), ..]) => {
            let next_path = match remaining_path {
                [FlattenNodePathSegment::List, rest @ ..] => rest,
                other => other,
            };
            for (index, item) in items.iter().enumerate() {
                current_path.push(ResponsePathSegment::Index(index));
                collect_positions_into(item, next_path, current_path, positions);
                current_path.pop();
            }
        }
        (value, []) => positions.push((current_path.clone(), value)),
        (Value::Object(map), [FlattenNodePathSegment::Field(name), rest @ ..]) => {
            if let Some(next_value) = map.get(name) {
                current_path.push(ResponsePathSegment::Field(name.clone()));
                collect_positions_into(next_value, rest, current_path, positions);
                current_path.pop();
            }
        }
        // Null, scalars, or a list segment that does not point to a list.
        _ => {}
    }
}

pub fn value_at_path_mut<'v>(
    value: &'v mut Value,
    path: &[ResponsePathSegment],
) -> Option<&'v mut Value> {
    path.iter()
        .try_fold(value, |current, segment| match (current, segment) {
            (Value::Object(map), ResponsePathSegment::Field(name)) => map.get_mut(name),
            (Value::Array(items), ResponsePathSegment::Index(index)) => items.get_mut(*index),
            _ => None,
        })
}
