use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// What the engine knows about a rendered field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Property name, or the index for array items.
    pub name: String,
    pub title: String,
    /// The retrieved (fully resolved) schema of the field.
    pub schema: Schema,
    /// Instance ID, see [`crate::form::id`].
    pub id: String,
    pub required: bool,
}
