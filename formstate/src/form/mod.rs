//! Form-level state built on top of [`crate::schema`].
//!
//! - [`id`] - Instance IDs derived from value paths
//! - [`errors`] - Validation errors grouped by instance ID
//! - [`keyed_array`] - Stable per-item keys for array fields
//! - [`config`] - Field descriptions handed to validators
//! - [`key_validation`] - Keeping additional property keys away from ID separators
//! - [`object`] - Value lookup by path and property ordering
//! - [`state`] - The form controller

/// Instance IDs.
pub mod id;

/// Validation errors grouped by instance ID.
pub mod errors;

/// Stable keys for array items.
pub mod keyed_array;

/// Field descriptions.
pub mod config;

/// Additional property key validation schema.
pub mod key_validation;

/// Value lookup by path.
pub mod object;

/// Form controller.
pub mod state;

pub use config::FieldConfig;
pub use errors::{Errors, FieldErrors, group_errors};
pub use id::{IdConfig, PathSegment, json_pointer_to_path, path_to_id, pseudo_id};
pub use keyed_array::{KeyedArray, TrackedArray};
pub use key_validation::additional_property_key_validation_schema;
pub use object::{get_value_by_path, original_keys_order};
pub use state::{FormOptions, FormState, InitialErrors, SubmitOutcome};
