//! Schema and value merging.
//!
//! Three merges with different semantics live here and must not be mixed up:
//!
//! - [`merge_schemas`] combines two *schemas* keyword by keyword.
//! - [`merge_schema_objects`] deep-merges two plain object *values*.
//! - [`merge_defaults_with_form_data`] overlays form data onto computed
//!   defaults, driven by the shape of the form data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{
    ADDITIONAL_ITEMS_KEY, ADDITIONAL_PROPERTIES_KEY, ALL_OF_KEY, ANY_OF_KEY, CONTAINS_KEY,
    DEFINITIONS_KEY, DEFS_KEY, DEPENDENCIES_KEY, ELSE_KEY, IF_KEY, ITEMS_KEY, NOT_KEY, ONE_OF_KEY,
    PATTERN_PROPERTIES_KEY, PROPERTIES_KEY, PROPERTY_NAMES_KEY, REQUIRED_KEY, Schema,
    SchemaObjectValue, THEN_KEY, is_truthy,
};

/// Keywords holding a single subschema.
const SUB_SCHEMAS: [&str; 8] = [
    ADDITIONAL_ITEMS_KEY,
    CONTAINS_KEY,
    ADDITIONAL_PROPERTIES_KEY,
    PROPERTY_NAMES_KEY,
    IF_KEY,
    THEN_KEY,
    ELSE_KEY,
    NOT_KEY,
];

/// Keywords holding a map of named subschemas.
const RECORDS_OF_SUB_SCHEMAS: [&str; 4] =
    [DEFS_KEY, PROPERTIES_KEY, PATTERN_PROPERTIES_KEY, DEFINITIONS_KEY];

/// Keywords holding a list of subschemas.
const ARRAYS_OF_SUB_SCHEMAS: [&str; 3] = [ALL_OF_KEY, ANY_OF_KEY, ONE_OF_KEY];

/// Array concatenation policy of [`merge_schema_objects`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcatArrays {
    /// Right array replaces the left one.
    #[default]
    No,
    /// Arrays are concatenated.
    Yes,
    /// Arrays are concatenated, skipping right elements already on the left.
    PreventDuplicates,
}

/// Pair the values of `key` on both sides when both are truthy.
fn both<'a>(left: &'a Schema, right: &'a Schema, key: &str) -> Option<(&'a Value, &'a Value)> {
    match (left.get(key), right.get(key)) {
        (Some(l), Some(r)) if is_truthy(l) && is_truthy(r) => Some((l, r)),
        _ => None,
    }
}

fn merge_records(
    left: &Map<String, Value>,
    right: &Map<String, Value>,
    merge: fn(&Value, &Value) -> Value,
) -> Map<String, Value> {
    let mut target = left.clone();
    for (key, value) in right {
        let merged = match left.get(key) {
            Some(l) => merge(l, value),
            None => value.clone(),
        };
        target.insert(key.clone(), merged);
    }
    target
}

fn merge_schema_definitions(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => Value::Object(merge_schemas(l, r)),
        _ => right.clone(),
    }
}

fn merge_schema_dependencies(left: &Value, right: &Value) -> Value {
    if left.is_array() || right.is_array() {
        return right.clone();
    }
    merge_schema_definitions(left, right)
}

fn merge_unique(left: &[Value], right: &[Value]) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::with_capacity(left.len() + right.len());
    for value in left.iter().chain(right) {
        if !merged.contains(value) {
            merged.push(value.clone());
        }
    }
    merged
}

/// Merge two schemas keyword by keyword.
///
/// All top-level keys are shallow-assigned (right overrides left), then the
/// subschema keyword families are combined recursively. Neither input is
/// modified.
pub fn merge_schemas(left: &Schema, right: &Schema) -> Schema {
    let mut merged = left.clone();
    for (key, value) in right {
        merged.insert(key.clone(), value.clone());
    }

    for key in RECORDS_OF_SUB_SCHEMAS {
        if let Some((Value::Object(l), Value::Object(r))) = both(left, right, key) {
            merged.insert(
                key.to_string(),
                Value::Object(merge_records(l, r, merge_schema_definitions)),
            );
        }
    }

    if let Some((l, r)) = both(left, right, ITEMS_KEY) {
        let items = match (l, r) {
            (Value::Object(l), Value::Object(r)) => Value::Object(merge_schemas(l, r)),
            _ => r.clone(),
        };
        merged.insert(ITEMS_KEY.to_string(), items);
    }

    if let Some((Value::Object(l), Value::Object(r))) = both(left, right, DEPENDENCIES_KEY) {
        merged.insert(
            DEPENDENCIES_KEY.to_string(),
            Value::Object(merge_records(l, r, merge_schema_dependencies)),
        );
    }

    for key in SUB_SCHEMAS {
        if let Some((l, r)) = both(left, right, key) {
            merged.insert(key.to_string(), merge_schema_definitions(l, r));
        }
    }

    for key in ARRAYS_OF_SUB_SCHEMAS {
        if let Some((Value::Array(l), Value::Array(r))) = both(left, right, key) {
            let mut concat = l.clone();
            concat.extend(r.iter().cloned());
            merged.insert(key.to_string(), Value::Array(concat));
        }
    }

    if let Some((Value::Array(l), Value::Array(r))) = both(left, right, REQUIRED_KEY) {
        merged.insert(REQUIRED_KEY.to_string(), Value::Array(merge_unique(l, r)));
    }

    merged
}

/// Deep-merge two plain object values.
///
/// For every key of `right`: nested objects recurse, arrays concatenate when
/// `concat_arrays` asks for it, anything else from `right` wins.
pub fn merge_schema_objects(
    left: &SchemaObjectValue,
    right: &SchemaObjectValue,
    concat_arrays: ConcatArrays,
) -> SchemaObjectValue {
    let mut acc = left.clone();
    for (key, r) in right {
        let merged = match (left.get(key), r) {
            (Some(Value::Object(l)), Value::Object(r)) => {
                Value::Object(merge_schema_objects(l, r, concat_arrays))
            }
            (Some(Value::Array(l)), Value::Array(r)) if concat_arrays != ConcatArrays::No => {
                let mut concat = l.clone();
                match concat_arrays {
                    ConcatArrays::PreventDuplicates => {
                        concat.extend(r.iter().filter(|v| !l.contains(v)).cloned())
                    }
                    _ => concat.extend(r.iter().cloned()),
                }
                Value::Array(concat)
            }
            _ => r.clone(),
        };
        acc.insert(key.clone(), merged);
    }
    acc
}

/// Overlay `form_data` onto `defaults`.
///
/// The merge follows the shape of the form data, not a schema:
///
/// - arrays merge element-wise; the form data length wins unless
///   `merge_extra_array_defaults` is set, in which case trailing defaults are
///   appended;
/// - objects merge key-wise over the form data keys, keeping default-only
///   keys;
/// - any other form data value, `null` included, replaces the default.
///
/// Undefined form data (`None`) leaves the defaults as they are.
pub fn merge_defaults_with_form_data(
    defaults: Option<&Value>,
    form_data: Option<&Value>,
    merge_extra_array_defaults: bool,
) -> Option<Value> {
    let Some(form_data) = form_data else {
        return defaults.cloned();
    };
    match form_data {
        Value::Array(items) => {
            let defaults_array: &[Value] = match defaults {
                Some(Value::Array(d)) => d,
                _ => &[],
            };
            let mut mapped: Vec<Value> = items
                .iter()
                .enumerate()
                .map(|(idx, value)| match defaults_array.get(idx) {
                    // Falsy defaults (0, false, "", null) are treated as absent.
                    Some(d) if is_truthy(d) => {
                        merge_defaults_with_form_data(Some(d), Some(value), merge_extra_array_defaults)
                            .unwrap_or_else(|| value.clone())
                    }
                    _ => value.clone(),
                })
                .collect();
            if merge_extra_array_defaults && mapped.len() < defaults_array.len() {
                mapped.extend(defaults_array[mapped.len()..].iter().cloned());
            }
            Some(Value::Array(mapped))
        }
        Value::Object(entries) => {
            let defaults_object = defaults.and_then(Value::as_object);
            let mut acc = defaults_object.cloned().unwrap_or_default();
            for (key, value) in entries {
                let merged = merge_defaults_with_form_data(
                    defaults_object.and_then(|d| d.get(key)),
                    Some(value),
                    merge_extra_array_defaults,
                );
                if let Some(merged) = merged {
                    acc.insert(key.clone(), merged);
                }
            }
            Some(Value::Object(acc))
        }
        scalar => Some(scalar.clone()),
    }
}
