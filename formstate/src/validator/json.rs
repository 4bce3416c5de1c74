use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use jsonschema::{Draft, error::ValidationErrorKind};
use serde_json::{Value, json};

use crate::{
    form::{
        config::FieldConfig,
        id::{IdConfig, PathSegment, json_pointer_to_path, path_to_id},
    },
    schema::{
        ALL_OF_KEY, CONST_KEY, DEFAULT_KEY, DEFINITIONS_KEY, ENUM_KEY, ID_KEY, PROPERTIES_KEY,
        REF_KEY, Schema, TITLE_KEY,
    },
    validator::{FormValidator, ValidationError, Validator},
};

/// [`Validator`] and [`FormValidator`] on top of the `jsonschema` crate.
///
/// Compiled schemas are cached by their serialized form until
/// [`Validator::reset`]. Subschemas are compiled together with the root so
/// local references resolve against it.
///
/// The error payload is the schema location that failed, as a JSON pointer.
pub struct JsonSchemaValidator {
    ids: IdConfig,
    draft: Draft,
    cache: Mutex<HashMap<String, Arc<jsonschema::Validator>>>,
}

impl Default for JsonSchemaValidator {
    fn default() -> Self {
        Self::new(IdConfig::default())
    }
}

impl JsonSchemaValidator {
    /// Draft 7 unless changed with [`Self::with_draft`]: tuple `items` and
    /// `dependencies` are draft 7 keywords.
    pub fn new(ids: IdConfig) -> Self {
        Self {
            ids,
            draft: Draft::Draft7,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }

    fn compile(&self, schema: &Value) -> Result<Arc<jsonschema::Validator>, String> {
        let key = schema.to_string();
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(validator) = cache.get(&key) {
            return Ok(validator.clone());
        }
        trace!("compiling schema {key}");
        let validator = jsonschema::options()
            .with_draft(self.draft)
            .build(schema)
            .map_err(|e| format!("invalid schema: {e}"))?;
        let validator = Arc::new(validator);
        cache.insert(key, validator.clone());
        Ok(validator)
    }

    /// Compile `schema` inside a document that keeps the root's pointer
    /// space: the root is carried under a reserved definition and every
    /// local `$ref` is rebased onto it, so `#` keeps meaning the root.
    fn with_root(schema: &Value, root_schema: &Schema) -> Value {
        if !schema.is_object() {
            return schema.clone();
        }
        let mut root = root_schema.clone();
        root.remove(ID_KEY);
        let mut root = Value::Object(root);
        rebase_local_refs(&mut root);
        let mut subject = schema.clone();
        rebase_local_refs(&mut subject);
        json!({
            ALL_OF_KEY: [subject],
            DEFINITIONS_KEY: { ROOT_DEFINITION: root }
        })
    }

    fn errors(
        &self,
        schema: &Value,
        data: &Value,
        id_of: impl Fn(&[PathSegment]) -> String,
        title_of: impl Fn(&str, &[PathSegment]) -> String,
    ) -> Vec<ValidationError<String>> {
        let validator = match self.compile(schema) {
            Ok(v) => v,
            Err(message) => {
                warn!("{message}");
                return vec![ValidationError {
                    instance_id: id_of(&[]),
                    property_title: String::new(),
                    message,
                    error: String::new(),
                }];
            }
        };
        validator
            .iter_errors(data)
            .map(|e| {
                let mut path = json_pointer_to_path(&e.instance_path.to_string());
                let mut schema_path = e.schema_path.to_string();
                // 必填错误指向缺失的属性本身
                if let ValidationErrorKind::Required { property } = &e.kind {
                    let name = match property {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    if let Some(parent) = schema_path.strip_suffix("/required") {
                        schema_path = format!("{parent}/{PROPERTIES_KEY}/{}", escape(&name));
                    }
                    path.push(PathSegment::Key(name));
                } else if let Some((parent, _keyword)) = schema_path.rsplit_once('/') {
                    schema_path = parent.to_string();
                }
                ValidationError {
                    instance_id: id_of(&path),
                    property_title: title_of(&schema_path, &path),
                    message: e.to_string(),
                    error: e.schema_path.to_string(),
                }
            })
            .collect()
    }
}

const ROOT_DEFINITION: &str = "formstate-root";

/// Values that are data, not schemas.
const DATA_KEYWORDS: [&str; 4] = [CONST_KEY, ENUM_KEY, DEFAULT_KEY, "examples"];

fn rebase_local_refs(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if DATA_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                if key == REF_KEY {
                    if let Value::String(reference) = value
                        && let Some(pointer) = reference.strip_prefix('#')
                        && (pointer.is_empty() || pointer.starts_with('/'))
                    {
                        *reference = format!("#/{DEFINITIONS_KEY}/{ROOT_DEFINITION}{pointer}");
                    }
                    continue;
                }
                rebase_local_refs(value);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rebase_local_refs),
        _ => {}
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// `title` of the schema at `pointer`, else the last key of `path`.
fn title_at(schema: &Value, pointer: &str, path: &[PathSegment]) -> String {
    schema
        .pointer(pointer)
        .and_then(|s| s.get(TITLE_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            path.iter().rev().find_map(|segment| match segment {
                PathSegment::Key(k) => Some(k.clone()),
                PathSegment::Index(_) => None,
            })
        })
        .unwrap_or_default()
}

impl Validator for JsonSchemaValidator {
    fn is_valid(&self, schema: &Value, root_schema: &Schema, form_data: Option<&Value>) -> bool {
        let combined = Self::with_root(schema, root_schema);
        match self.compile(&combined) {
            Ok(validator) => validator.is_valid(form_data.unwrap_or(&Value::Null)),
            Err(message) => {
                warn!("{message}");
                false
            }
        }
    }

    fn reset(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl FormValidator<String> for JsonSchemaValidator {
    fn validate_form_data(
        &self,
        root_schema: &Schema,
        form_data: Option<&Value>,
    ) -> Vec<ValidationError<String>> {
        let schema = Value::Object(root_schema.clone());
        self.errors(
            &schema,
            form_data.unwrap_or(&Value::Null),
            |path| self.ids.id(path),
            |pointer, path| title_at(&schema, pointer, path),
        )
    }

    fn validate_field_data(
        &self,
        field: &FieldConfig,
        field_data: Option<&Value>,
    ) -> Vec<ValidationError<String>> {
        let schema = Value::Object(field.schema.clone());
        self.errors(
            &schema,
            field_data.unwrap_or(&Value::Null),
            |path| path_to_id(&field.id, &self.ids.separator, path),
            |pointer, path| {
                if path.is_empty() {
                    field.title.clone()
                } else {
                    title_at(&schema, pointer, path)
                }
            },
        )
    }
}
