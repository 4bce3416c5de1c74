//! JSON Schema handling.
//!
//! This module contains everything that operates on schemas themselves:
//!
//! - [`types`] - Type classification of values and schemas
//! - [`merge`] - Schema merge, value merge and defaults/form-data merge
//! - [`resolve`] - `$ref`, `allOf`, conditional and dependency resolution
//! - [`matching`] - `oneOf`/`anyOf` branch selection
//! - [`default_state`] - Default form state derivation
//! - [`merger`] - Pluggable merger capabilities
//! - [`file`] - File upload schema detection
//! - [`options`] - Enum option extraction and index mapping
//!
//! Schemas are plain [`serde_json`] values. A schema definition is either a
//! boolean or an object; most operations work on the object form, [`Schema`].

use serde_json::{Map, Value};
use thiserror::Error;

/// Type classification of values and schemas.
pub mod types;

/// Schema merge, value merge and defaults/form-data merge.
pub mod merge;

/// Schema resolution.
pub mod resolve;

/// Union branch selection.
pub mod matching;

/// Default form state derivation.
pub mod default_state;

/// Pluggable merger capabilities.
pub mod merger;

/// File upload schema detection.
pub mod file;

/// Enum option extraction and index mapping.
pub mod options;

pub use default_state::{DefaultStateBehavior, get_default_form_state};
pub use merge::{ConcatArrays, merge_defaults_with_form_data, merge_schema_objects, merge_schemas};
pub use merger::{DefaultFormMerger, DefaultSchemaMerger, FormMerger, SchemaMerger};
pub use resolve::retrieve_schema;
pub use types::{SchemaType, SchemaTypes};

/// Object form of a JSON Schema.
pub type Schema = Map<String, Value>;

/// Object form of a form value.
pub type SchemaObjectValue = Map<String, Value>;

pub const REF_KEY: &str = "$ref";
pub const ID_KEY: &str = "$id";
pub const DEFS_KEY: &str = "$defs";
pub const DEFINITIONS_KEY: &str = "definitions";

pub const TYPE_KEY: &str = "type";
pub const CONST_KEY: &str = "const";
pub const ENUM_KEY: &str = "enum";
pub const DEFAULT_KEY: &str = "default";
pub const FORMAT_KEY: &str = "format";
pub const TITLE_KEY: &str = "title";

pub const PROPERTIES_KEY: &str = "properties";
pub const PATTERN_PROPERTIES_KEY: &str = "patternProperties";
pub const ADDITIONAL_PROPERTIES_KEY: &str = "additionalProperties";
pub const PROPERTY_NAMES_KEY: &str = "propertyNames";
pub const REQUIRED_KEY: &str = "required";
pub const DEPENDENCIES_KEY: &str = "dependencies";

pub const ITEMS_KEY: &str = "items";
pub const ADDITIONAL_ITEMS_KEY: &str = "additionalItems";
pub const CONTAINS_KEY: &str = "contains";
pub const MIN_ITEMS_KEY: &str = "minItems";

pub const IF_KEY: &str = "if";
pub const THEN_KEY: &str = "then";
pub const ELSE_KEY: &str = "else";

pub const ALL_OF_KEY: &str = "allOf";
pub const ANY_OF_KEY: &str = "anyOf";
pub const ONE_OF_KEY: &str = "oneOf";
pub const NOT_KEY: &str = "not";

/// Marker placed on property schemas synthesized for additional properties.
pub const ADDITIONAL_PROPERTY_FLAG: &str = "__additional_property";

/// `format` value of a file upload encoded as a data URL.
pub const DATA_URL_FORMAT: &str = "data-url";

/// Errors raised while classifying, resolving or deriving schemas.
///
/// All variants are fatal for the call that produced them: the operations in
/// this crate are pure, so retrying with the same inputs fails the same way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A type name outside the JSON Schema type vocabulary.
    #[error("Unsupported schema type: {0}")]
    UnsupportedType(String),
    /// Type inference produced no candidate types.
    #[error("Unsupported schema types: empty type array")]
    EmptyTypeSet,
    /// A `$ref` chain revisited a target during one resolution.
    #[error("Cyclic reference detected: {chain}")]
    CyclicReference {
        /// The reference that was visited twice.
        reference: String,
        /// The chain of references, joined with ` -> `.
        chain: String,
    },
    /// A `$ref` target does not exist in the root schema.
    #[error("Could not find a definition for {0}")]
    UnresolvedReference(String),
    /// A value that must be a schema is neither an object nor a boolean.
    #[error("Invalid schema at {path}: expected object or boolean, got {actual}")]
    InvalidSchema {
        /// Location of the offending value.
        path: String,
        /// The offending value, rendered as JSON.
        actual: String,
    },
}

/// Convenience result alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Returns `true` when `items` holds a single schema rather than a tuple.
pub fn is_normal_array_items(items: Option<&Value>) -> bool {
    matches!(items, Some(Value::Object(_)))
}

/// Convert a schema definition into its object form.
///
/// `true` becomes the empty schema `{}`, `false` becomes `{"not": {}}`.
pub fn to_schema(definition: &Value, path: &str) -> Result<Schema> {
    match definition {
        Value::Object(obj) => Ok(obj.clone()),
        Value::Bool(true) => Ok(Schema::new()),
        Value::Bool(false) => {
            let mut schema = Schema::new();
            schema.insert(NOT_KEY.to_string(), Value::Object(Schema::new()));
            Ok(schema)
        }
        other => Err(SchemaError::InvalidSchema {
            path: path.to_string(),
            actual: other.to_string(),
        }),
    }
}

/// JS-style truthiness of a keyword value.
///
/// Keyword families are only combined when both sides are truthy; a `false`
/// operand falls through to the shallow-assign result.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Names of the properties listed in `required`.
pub fn required_names(schema: &Schema) -> Vec<&str> {
    schema
        .get(REQUIRED_KEY)
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
