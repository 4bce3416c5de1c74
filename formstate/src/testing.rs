//! Test helpers shared by the unit tests.

use serde_json::Value;

use crate::{
    form::config::FieldConfig,
    schema::{REF_KEY, Schema, resolve::find_schema_definition},
    validator::{FormValidator, ValidationError, Validator},
};

/// A small structural validator covering the keywords the tests rely on:
/// `$ref`, `type`, `const`, `enum`, `required`, `properties`, `items`,
/// `minLength`, `minimum`, `not`, `allOf`, `anyOf` and `oneOf`.
pub struct TestValidator;

impl TestValidator {
    fn check(&self, schema: &Value, root: &Schema, data: &Value) -> bool {
        let schema = match schema {
            Value::Bool(b) => return *b,
            Value::Object(s) => s,
            _ => return false,
        };
        if let Some(reference) = schema.get(REF_KEY).and_then(Value::as_str) {
            let Ok(target) = find_schema_definition(reference, root) else {
                return false;
            };
            if !self.check(&target, root, data) {
                return false;
            }
        }
        if let Some(ty) = schema.get("type") {
            let names: Vec<&str> = match ty {
                Value::String(s) => vec![s.as_str()],
                Value::Array(a) => a.iter().filter_map(Value::as_str).collect(),
                _ => vec![],
            };
            if !names.iter().any(|name| type_matches(name, data)) {
                return false;
            }
        }
        if let Some(expected) = schema.get("const")
            && expected != data
        {
            return false;
        }
        if let Some(Value::Array(members)) = schema.get("enum")
            && !members.contains(data)
        {
            return false;
        }
        if let Value::Object(obj) = data {
            if let Some(Value::Array(required)) = schema.get("required")
                && !required
                    .iter()
                    .filter_map(Value::as_str)
                    .all(|name| obj.contains_key(name))
            {
                return false;
            }
            if let Some(Value::Object(props)) = schema.get("properties") {
                for (key, prop) in props {
                    if let Some(value) = obj.get(key)
                        && !self.check(prop, root, value)
                    {
                        return false;
                    }
                }
            }
        }
        if let (Value::Array(items), Some(item_schema @ Value::Object(_))) =
            (data, schema.get("items"))
            && !items.iter().all(|item| self.check(item_schema, root, item))
        {
            return false;
        }
        if let (Value::String(s), Some(min)) =
            (data, schema.get("minLength").and_then(Value::as_u64))
            && (s.chars().count() as u64) < min
        {
            return false;
        }
        if let (Value::Number(n), Some(min)) =
            (data, schema.get("minimum").and_then(Value::as_f64))
            && n.as_f64().is_some_and(|n| n < min)
        {
            return false;
        }
        if let Some(not) = schema.get("not")
            && self.check(not, root, data)
        {
            return false;
        }
        if let Some(Value::Array(all)) = schema.get("allOf")
            && !all.iter().all(|s| self.check(s, root, data))
        {
            return false;
        }
        if let Some(Value::Array(any)) = schema.get("anyOf")
            && !any.iter().any(|s| self.check(s, root, data))
        {
            return false;
        }
        if let Some(Value::Array(one)) = schema.get("oneOf")
            && one.iter().filter(|s| self.check(s, root, data)).count() != 1
        {
            return false;
        }
        true
    }
}

fn type_matches(name: &str, data: &Value) -> bool {
    match name {
        "null" => data.is_null(),
        "boolean" => data.is_boolean(),
        "number" => data.is_number(),
        "integer" => data.is_i64() || data.is_u64(),
        "string" => data.is_string(),
        "array" => data.is_array(),
        "object" => data.is_object(),
        _ => false,
    }
}

impl Validator for TestValidator {
    fn is_valid(&self, schema: &Value, root_schema: &Schema, form_data: Option<&Value>) -> bool {
        self.check(schema, root_schema, form_data.unwrap_or(&Value::Null))
    }
}

impl FormValidator<String> for TestValidator {
    fn validate_form_data(
        &self,
        root_schema: &Schema,
        form_data: Option<&Value>,
    ) -> Vec<ValidationError<String>> {
        let data = form_data.cloned().unwrap_or(Value::Null);
        let mut errors = Vec::new();
        if let (Some(Value::Array(required)), Value::Object(obj)) =
            (root_schema.get("required"), &data)
        {
            for name in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(name) {
                    errors.push(ValidationError {
                        instance_id: format!("root.{name}"),
                        property_title: name.to_string(),
                        message: "is a required property".to_string(),
                        error: "required".to_string(),
                    });
                }
            }
        }
        if errors.is_empty() && !self.check(&Value::Object(root_schema.clone()), root_schema, &data)
        {
            errors.push(ValidationError {
                instance_id: "root".to_string(),
                property_title: String::new(),
                message: "is invalid".to_string(),
                error: "schema".to_string(),
            });
        }
        errors
    }

    fn validate_field_data(
        &self,
        field: &FieldConfig,
        field_data: Option<&Value>,
    ) -> Vec<ValidationError<String>> {
        let data = field_data.cloned().unwrap_or(Value::Null);
        if self.check(&Value::Object(field.schema.clone()), &Schema::new(), &data) {
            return Vec::new();
        }
        vec![ValidationError {
            instance_id: field.id.clone(),
            property_title: field.title.clone(),
            message: "is invalid".to_string(),
            error: "field".to_string(),
        }]
    }
}
