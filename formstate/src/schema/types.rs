use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{
    ADDITIONAL_PROPERTIES_KEY, CONST_KEY, ENUM_KEY, PROPERTIES_KEY, Result, Schema, SchemaError,
    TYPE_KEY,
};

/// JSON Schema primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Null,
    Boolean,
    Number,
    Integer,
    String,
    Array,
    Object,
}

impl SchemaType {
    /// The keyword spelling of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Null => "null",
            SchemaType::Boolean => "boolean",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::String => "string",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }

    /// The zero value used for a required scalar without a default.
    ///
    /// Containers have no zero value here; their empty shape is produced by
    /// the default-state walk itself.
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            SchemaType::Null => Some(Value::Null),
            SchemaType::Boolean => Some(Value::Bool(false)),
            SchemaType::Number | SchemaType::Integer => Some(Value::from(0)),
            SchemaType::String => Some(Value::String(String::new())),
            SchemaType::Array | SchemaType::Object => None,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "null" => Ok(SchemaType::Null),
            "boolean" => Ok(SchemaType::Boolean),
            "number" => Ok(SchemaType::Number),
            "integer" => Ok(SchemaType::Integer),
            "string" => Ok(SchemaType::String),
            "array" => Ok(SchemaType::Array),
            "object" => Ok(SchemaType::Object),
            other => Err(SchemaError::UnsupportedType(other.to_string())),
        }
    }
}

/// Result of [`type_of_schema`]: a single type or a union of types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaTypes {
    One(SchemaType),
    Many(Vec<SchemaType>),
}

impl SchemaTypes {
    /// Whether `ty` is (one of) the types.
    pub fn contains(&self, ty: SchemaType) -> bool {
        match self {
            SchemaTypes::One(t) => *t == ty,
            SchemaTypes::Many(types) => types.contains(&ty),
        }
    }

    /// Collapse to a single representative type.
    pub fn pick(&self) -> Result<SchemaType> {
        match self {
            SchemaTypes::One(t) => Ok(*t),
            SchemaTypes::Many(types) => pick_schema_type(types),
        }
    }
}

/// Map a runtime value to its schema type name.
///
/// Numbers are always reported as [`SchemaType::Number`]; integer inference
/// is left to explicit `type` declarations.
pub fn type_of_value(value: &Value) -> SchemaType {
    match value {
        Value::Null => SchemaType::Null,
        Value::Bool(_) => SchemaType::Boolean,
        Value::Number(_) => SchemaType::Number,
        Value::String(_) => SchemaType::String,
        Value::Array(_) => SchemaType::Array,
        Value::Object(_) => SchemaType::Object,
    }
}

fn parse_type_keyword(value: &Value) -> Result<SchemaTypes> {
    match value {
        Value::String(s) => Ok(SchemaTypes::One(s.parse()?)),
        Value::Array(names) => {
            let mut types = Vec::with_capacity(names.len());
            for name in names {
                let Some(name) = name.as_str() else {
                    return Err(SchemaError::UnsupportedType(name.to_string()));
                };
                types.push(name.parse()?);
            }
            Ok(SchemaTypes::Many(types))
        }
        other => Err(SchemaError::UnsupportedType(other.to_string())),
    }
}

/// Report the type(s) a schema describes.
///
/// Resolution order: explicit `type`, then the type of `const`, then
/// `object` when `properties`/`additionalProperties` are present, then the
/// distinct member types of a non-empty `enum`, finally `null`.
pub fn type_of_schema(schema: &Schema) -> Result<SchemaTypes> {
    if let Some(ty) = schema.get(TYPE_KEY) {
        return parse_type_keyword(ty);
    }
    if let Some(value) = schema.get(CONST_KEY) {
        return Ok(SchemaTypes::One(type_of_value(value)));
    }
    if schema.contains_key(PROPERTIES_KEY) || schema.contains_key(ADDITIONAL_PROPERTIES_KEY) {
        return Ok(SchemaTypes::One(SchemaType::Object));
    }
    if let Some(Value::Array(members)) = schema.get(ENUM_KEY)
        && !members.is_empty()
    {
        let mut types = Vec::new();
        for ty in members.iter().map(type_of_value) {
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        return Ok(SchemaTypes::Many(types));
    }
    Ok(SchemaTypes::One(SchemaType::Null))
}

/// Pick the type a union should be rendered as.
///
/// Nullable unions like `["null", "string"]` pick their non-null variant.
pub fn pick_schema_type(types: &[SchemaType]) -> Result<SchemaType> {
    match types {
        [] => Err(SchemaError::EmptyTypeSet),
        [SchemaType::Null, second, ..] => Ok(*second),
        [first, ..] => Ok(*first),
    }
}

/// [`type_of_schema`] collapsed through [`pick_schema_type`].
pub fn get_simple_schema_type(schema: &Schema) -> Result<SchemaType> {
    type_of_schema(schema)?.pick()
}

/// Whether the schema accepts `null`.
pub fn is_schema_nullable(schema: &Schema) -> Result<bool> {
    Ok(type_of_schema(schema)?.contains(SchemaType::Null))
}
