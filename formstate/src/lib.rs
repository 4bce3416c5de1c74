//! # formstate
//!
//! JSON Schema driven form state: schema resolution, default value
//! derivation and form-level error bookkeeping, without any rendering.
//!
//! ## Features
//!
//! - Schema classification, merging and `allOf` folding
//! - `$ref`, `if`/`then`/`else` and `dependencies` resolution with cycle detection
//! - `oneOf`/`anyOf` branch selection driven by the current data
//! - Default form state derivation that never overrides user data
//! - Instance IDs, grouped validation errors and stable array item keys
//! - A [`FormState`] controller and a bundled `jsonschema` validator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use formstate::{FormOptions, FormState, JsonSchemaValidator, SubmitOutcome};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string", "default": "qemu"}},
//!     "required": ["name"]
//! });
//! let schema = schema.as_object().unwrap().clone();
//!
//! let mut form = FormState::<_, String>::new(FormOptions::new(
//!     Arc::new(JsonSchemaValidator::default()),
//!     schema,
//! ))
//! .unwrap();
//! assert_eq!(form.value(), Some(&json!({"name": "qemu"})));
//! assert!(matches!(form.submit(), SubmitOutcome::Valid(_)));
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Schema classification, merge, resolution and defaults
//! - [`validator`] - Validator capabilities and the bundled implementation
//! - [`form`] - IDs, errors, array keys and the form controller
//! - [`run`] - File loading and typed configuration helpers

#[macro_use]
extern crate log;

/// Schema classification, merge, resolution and default state derivation.
///
/// Everything here is pure: results depend only on the arguments.
pub mod schema;

/// Validator capabilities consumed by the engine.
pub mod validator;

/// Form-level state: IDs, grouped errors, array keys and the controller.
pub mod form;

/// File loading and typed configuration helpers.
pub mod run;

#[cfg(test)]
mod testing;

pub use form::{Errors, FieldConfig, FormOptions, FormState, IdConfig, SubmitOutcome};
pub use schema::{
    DefaultStateBehavior, Schema, SchemaError, get_default_form_state, retrieve_schema,
};
pub use serde_json::Value;
pub use validator::{FormValidator, JsonSchemaValidator, ValidationError, Validator};
