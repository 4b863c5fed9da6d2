use serde_json::{Map, Value};

/// Deeply merges `source` into `target`.
///
/// Objects are united key by key and lists of the same length are merged
/// element-wise. On any other collision the newest value wins, with one exception:
/// a `null` never erases a value that is already present.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        // If the source value is null, we do nothing.
        (_, Value::Null) => {}

        (Value::Object(target_map), Value::Object(source_map)) => {
            deep_merge_objects(target_map, source_map);
        }

        (Value::Array(target_arr), Value::Array(source_arr))
            if target_arr.len() == source_arr.len() =>
        {
            for (target_val, source_val) in target_arr.iter_mut().zip(source_arr) {
                deep_merge(target_val, source_val);
            }
        }

        // The types don't match, the lists have a different length or the target is a scalar.
        (target_val, source_val) => {
            *target_val = source_val;
        }
    }
}

pub fn deep_merge_objects(target_map: &mut Map<String, Value>, source_map: Map<String, Value>) {
    if target_map.is_empty() {
        *target_map = source_map;
        return;
    }

    for (key, source_val) in source_map {
        match target_map.get_mut(&key) {
            Some(target_val) => deep_merge(target_val, source_val),
            None => {
                target_map.insert(key, source_val);
            }
        }
    }
}
