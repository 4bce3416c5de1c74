//! Validation capabilities consumed by the engine.
//!
//! The engine never validates by itself. Branch selection (`if`/`then`/`else`,
//! `oneOf`/`anyOf`, dependencies) asks a [`Validator`]; form-level validation
//! is delegated to a [`FormValidator`] and its flat error list is grouped by
//! [`crate::form::errors::group_errors`].
//!
//! A ready-made implementation based on the `jsonschema` crate lives in
//! [`json`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{form::config::FieldConfig, schema::Schema};

/// [`FormValidator`] backed by the `jsonschema` crate.
pub mod json;

pub use json::JsonSchemaValidator;

/// Answers "does this value satisfy this schema".
pub trait Validator {
    /// Check `form_data` against `schema`, resolving `$ref` against
    /// `root_schema`. Undefined data is passed as `None`.
    fn is_valid(&self, schema: &Value, root_schema: &Schema, form_data: Option<&Value>) -> bool;

    /// Drop any cached state (compiled schemas and the like).
    fn reset(&self) {}
}

/// A single validation failure.
///
/// `error` is the validator's own payload; the engine never looks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError<E> {
    /// Identifier of the instance the error targets.
    pub instance_id: String,
    /// Human readable name of the property.
    pub property_title: String,
    /// Error message.
    pub message: String,
    /// Validator specific payload.
    pub error: E,
}

/// A [`ValidationError`] before it is attached to an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError<E> {
    pub property_title: String,
    pub message: String,
    pub error: E,
}

impl<E> FieldError<E> {
    /// Attach the error to `instance_id`.
    pub fn with_instance_id(self, instance_id: impl Into<String>) -> ValidationError<E> {
        ValidationError {
            instance_id: instance_id.into(),
            property_title: self.property_title,
            message: self.message,
            error: self.error,
        }
    }
}

impl<E> From<ValidationError<E>> for FieldError<E> {
    fn from(value: ValidationError<E>) -> Self {
        Self {
            property_title: value.property_title,
            message: value.message,
            error: value.error,
        }
    }
}

/// Full-form and per-field validation.
pub trait FormValidator<E>: Validator {
    /// Validate the whole form value against the root schema.
    fn validate_form_data(
        &self,
        root_schema: &Schema,
        form_data: Option<&Value>,
    ) -> Vec<ValidationError<E>>;

    /// Validate the value of a single field.
    fn validate_field_data(
        &self,
        field: &FieldConfig,
        field_data: Option<&Value>,
    ) -> Vec<ValidationError<E>>;
}

/// Payload of errors produced by additional property key validation.
///
/// Form error types must be convertible from it, see
/// [`crate::form::FormState::validate_additional_property_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalPropertyKeyError;

impl fmt::Display for AdditionalPropertyKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("additional-property-key-error")
    }
}

impl From<AdditionalPropertyKeyError> for String {
    fn from(value: AdditionalPropertyKeyError) -> Self {
        value.to_string()
    }
}

/// Validates the keys users type in for additional properties.
pub trait AdditionalPropertyKeyValidator {
    /// Returns the list of problems with `key`; empty when the key is fine.
    fn validate_additional_property_key(&self, key: &str) -> Vec<String>;
}

impl<F> AdditionalPropertyKeyValidator for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn validate_additional_property_key(&self, key: &str) -> Vec<String> {
        self(key)
    }
}
