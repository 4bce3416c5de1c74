use serde_json::Value;

use crate::{
    form::id::PathSegment,
    schema::{ADDITIONAL_PROPERTY_FLAG, SchemaObjectValue},
};

/// Follow `path` through objects and arrays.
///
/// Arrays are only stepped into by index. Objects accept any segment, an
/// index addresses the key spelled with its digits.
pub fn get_value_by_path<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match (current, segment) {
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
        (Value::Object(map), segment) => map.get(&segment.to_string()),
        _ => None,
    })
}

/// Mutable counterpart of [`get_value_by_path`].
pub fn get_value_by_path_mut<'a>(
    value: &'a mut Value,
    path: &[PathSegment],
) -> Option<&'a mut Value> {
    path.iter()
        .try_fold(value, |current, segment| match (current, segment) {
            (Value::Array(items), PathSegment::Index(i)) => items.get_mut(*i),
            (Value::Object(map), segment) => map.get_mut(&segment.to_string()),
            _ => None,
        })
}

/// Display order of declared properties.
///
/// Non-object entries and synthesized additional properties are skipped; if
/// anything was skipped a trailing `"*"` stands for the rest.
pub fn original_keys_order(properties: &SchemaObjectValue) -> Vec<String> {
    let mut order: Vec<String> = properties
        .iter()
        .filter(|(_, property)| {
            property
                .as_object()
                .is_some_and(|p| !p.contains_key(ADDITIONAL_PROPERTY_FLAG))
        })
        .map(|(key, _)| key.clone())
        .collect();
    if order.len() < properties.len() {
        order.push("*".to_string());
    }
    order
}
