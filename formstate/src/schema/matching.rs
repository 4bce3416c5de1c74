use std::borrow::Cow;

use serde_json::{Value, json};

use crate::{
    schema::{
        ANY_OF_KEY, PROPERTIES_KEY, REF_KEY, REQUIRED_KEY, Schema, merge_schemas,
        resolve::find_schema_definition,
    },
    validator::Validator,
};

/// Index of the first `oneOf`/`anyOf` option valid against `form_data`.
///
/// Options declaring `properties` only match data carrying at least one of
/// those properties, so an empty object does not match every option. Their
/// own `required` list is ignored for the match: a half filled form still
/// selects the branch it belongs to. `$ref` options are dereferenced first.
/// Undefined data selects the first option.
pub fn get_first_matching_option<V: Validator + ?Sized>(
    validator: &V,
    form_data: Option<&Value>,
    options: &[Value],
    root_schema: &Schema,
) -> Option<usize> {
    if form_data.is_none() {
        return (!options.is_empty()).then_some(0);
    }
    options.iter().position(|option| {
        let option = dereference(option, root_schema);
        let Some(Value::Object(properties)) = option.get(PROPERTIES_KEY) else {
            return validator.is_valid(&option, root_schema, form_data);
        };
        let requires_any_of = Value::Array(
            properties
                .keys()
                .map(|key| json!({ "required": [key] }))
                .collect(),
        );
        let mut augmented = option.as_object().cloned().unwrap_or_default();
        match augmented.remove(ANY_OF_KEY) {
            Some(any_of) => {
                augmented.insert(
                    "allOf".to_string(),
                    json!([{ "anyOf": any_of }, { "anyOf": requires_any_of }]),
                );
            }
            None => {
                augmented.insert(ANY_OF_KEY.to_string(), requires_any_of);
            }
        }
        augmented.remove(REQUIRED_KEY);
        validator.is_valid(&Value::Object(augmented), root_schema, form_data)
    })
}

/// Follow the `$ref` chain of `option`, keeping its sibling keywords.
///
/// An unresolvable or looping chain stops where it is.
fn dereference<'a>(option: &'a Value, root_schema: &Schema) -> Cow<'a, Value> {
    let mut current = Cow::Borrowed(option);
    let mut seen: Vec<String> = Vec::new();
    loop {
        let Some(reference) = current.get(REF_KEY).and_then(Value::as_str) else {
            return current;
        };
        if seen.iter().any(|r| r == reference) {
            return current;
        }
        let Ok(Value::Object(target)) = find_schema_definition(reference, root_schema) else {
            return current;
        };
        seen.push(reference.to_string());
        let mut siblings = current.as_object().cloned().unwrap_or_default();
        siblings.remove(REF_KEY);
        current = Cow::Owned(Value::Object(merge_schemas(&target, &siblings)));
    }
}

/// [`get_first_matching_option`] falling back to the first option.
pub fn get_matching_option_or_first<V: Validator + ?Sized>(
    validator: &V,
    form_data: Option<&Value>,
    options: &[Value],
    root_schema: &Schema,
) -> usize {
    get_first_matching_option(validator, form_data, options, root_schema).unwrap_or(0)
}
