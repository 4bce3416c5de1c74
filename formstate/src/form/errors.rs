use indexmap::IndexMap;

use crate::validator::ValidationError;

/// Errors of one instance, in the order the validator reported them.
pub type FieldErrors<E> = Vec<ValidationError<E>>;

/// Errors keyed by instance ID. Iteration follows first appearance.
pub type Errors<E> = IndexMap<String, FieldErrors<E>>;

/// Group a flat error list by instance ID.
pub fn group_errors<E>(errors: impl IntoIterator<Item = ValidationError<E>>) -> Errors<E> {
    let mut grouped = Errors::new();
    for error in errors {
        grouped
            .entry(error.instance_id.clone())
            .or_insert_with(Vec::new)
            .push(error);
    }
    grouped
}
