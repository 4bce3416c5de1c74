use serde_json::{Value, json};

use crate::schema::{
    ADDITIONAL_ITEMS_KEY, ADDITIONAL_PROPERTIES_KEY, ALL_OF_KEY, ANY_OF_KEY, CONTAINS_KEY,
    DEFINITIONS_KEY, DEFS_KEY, DEPENDENCIES_KEY, ELSE_KEY, IF_KEY, ITEMS_KEY, NOT_KEY, ONE_OF_KEY,
    PATTERN_PROPERTIES_KEY, PROPERTIES_KEY, PROPERTY_NAMES_KEY, Schema, THEN_KEY,
};

const SINGLE_SUB_SCHEMAS: [&str; 7] = [
    ADDITIONAL_PROPERTIES_KEY,
    ADDITIONAL_ITEMS_KEY,
    CONTAINS_KEY,
    IF_KEY,
    THEN_KEY,
    ELSE_KEY,
    NOT_KEY,
];
const RECORD_SUB_SCHEMAS: [&str; 5] = [
    PROPERTIES_KEY,
    PATTERN_PROPERTIES_KEY,
    DEFS_KEY,
    DEFINITIONS_KEY,
    DEPENDENCIES_KEY,
];
const ARRAY_SUB_SCHEMAS: [&str; 3] = [ALL_OF_KEY, ANY_OF_KEY, ONE_OF_KEY];

/// Copy of `schema` whose additional property keys may not contain any of
/// `separators`.
///
/// Every object schema allowing additional properties gets a `propertyNames`
/// rule; an existing rule is kept alongside through `allOf`. Without this a
/// key like `a.b` would produce the same instance ID as a nested property.
pub fn additional_property_key_validation_schema(schema: &Schema, separators: &[&str]) -> Schema {
    let pattern = separators
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    if pattern.is_empty() {
        return schema.clone();
    }
    let rule = json!({ "not": { "pattern": pattern } });
    transform(schema, &rule)
}

fn transform(schema: &Schema, rule: &Value) -> Schema {
    let mut copy = schema.clone();
    for key in SINGLE_SUB_SCHEMAS {
        if let Some(Value::Object(sub)) = copy.get_mut(key) {
            *sub = transform(sub, rule);
        }
    }
    for key in RECORD_SUB_SCHEMAS {
        if let Some(Value::Object(record)) = copy.get_mut(key) {
            for sub in record.values_mut() {
                if let Value::Object(s) = sub {
                    *s = transform(s, rule);
                }
            }
        }
    }
    for key in ARRAY_SUB_SCHEMAS {
        if let Some(Value::Array(list)) = copy.get_mut(key) {
            for sub in list.iter_mut() {
                if let Value::Object(s) = sub {
                    *s = transform(s, rule);
                }
            }
        }
    }
    match copy.get_mut(ITEMS_KEY) {
        Some(Value::Object(items)) => *items = transform(items, rule),
        Some(Value::Array(items)) => {
            for sub in items.iter_mut() {
                if let Value::Object(s) = sub {
                    *s = transform(s, rule);
                }
            }
        }
        _ => {}
    }

    let allows_additional = matches!(
        copy.get(ADDITIONAL_PROPERTIES_KEY),
        Some(Value::Object(_) | Value::Bool(true))
    );
    if allows_additional {
        let names = match copy.remove(PROPERTY_NAMES_KEY) {
            Some(existing) => json!({ "allOf": [existing, rule] }),
            None => rule.clone(),
        };
        copy.insert(PROPERTY_NAMES_KEY.to_string(), names);
    }
    copy
}
