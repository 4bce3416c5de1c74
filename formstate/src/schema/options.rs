use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{ANY_OF_KEY, CONST_KEY, ENUM_KEY, ONE_OF_KEY, Schema, TITLE_KEY};

/// A selectable value of an enum-like schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOption {
    pub label: String,
    pub value: Value,
}

fn label_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Collect the options of a select-like schema.
///
/// `enum` members are used as-is; otherwise `oneOf`/`anyOf` entries carrying
/// a `const` become options labelled by their `title`.
pub fn enum_options_from_schema(schema: &Schema) -> Option<Vec<EnumOption>> {
    if let Some(Value::Array(members)) = schema.get(ENUM_KEY) {
        return Some(
            members
                .iter()
                .map(|value| EnumOption {
                    label: label_of(value),
                    value: value.clone(),
                })
                .collect(),
        );
    }
    let alternatives = schema
        .get(ONE_OF_KEY)
        .or_else(|| schema.get(ANY_OF_KEY))
        .and_then(Value::as_array)?;
    alternatives
        .iter()
        .map(|alt| {
            let value = alt.get(CONST_KEY)?.clone();
            let label = alt
                .get(TITLE_KEY)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| label_of(&value));
            Some(EnumOption { label, value })
        })
        .collect()
}

/// Maps form values to option indices and back.
pub struct IndexMapper<'a> {
    options: &'a [EnumOption],
}

impl<'a> IndexMapper<'a> {
    pub fn new(options: &'a [EnumOption]) -> Self {
        Self { options }
    }

    /// Index of the option holding `value` (deep equality).
    pub fn from_value(&self, value: Option<&Value>) -> Option<usize> {
        let value = value?;
        self.options.iter().position(|option| &option.value == value)
    }

    /// Value of the option at `index`.
    pub fn to_value(&self, index: usize) -> Option<&'a Value> {
        self.options.get(index).map(|option| &option.value)
    }

    /// Indices of every known value in `values`, unknown values skipped.
    pub fn from_values(&self, values: Option<&[Value]>) -> Vec<usize> {
        values
            .unwrap_or_default()
            .iter()
            .filter_map(|v| self.from_value(Some(v)))
            .collect()
    }

    /// Values of the options at `indices`.
    pub fn to_values(&self, indices: &[usize]) -> Vec<Value> {
        indices
            .iter()
            .filter_map(|&i| self.to_value(i).cloned())
            .collect()
    }
}
