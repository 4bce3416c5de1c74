use std::sync::Arc;

use serde_json::Value;

use crate::{
    schema::{
        ALL_OF_KEY, DefaultStateBehavior, Result, Schema, get_default_form_state, merge_schemas,
        to_schema,
    },
    validator::Validator,
};

/// Folds an `allOf` composition into a single schema.
///
/// The resolver hands over a schema whose `allOf` entries are already
/// resolved; implementations only decide how entries are combined.
pub trait SchemaMerger {
    fn merge_all_of(&self, schema: &Schema) -> Result<Schema>;
}

/// Left-to-right fold through [`merge_schemas`].
///
/// The schema without its `allOf` keyword is the starting point; each entry
/// is merged on top of the accumulator in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSchemaMerger;

impl SchemaMerger for DefaultSchemaMerger {
    fn merge_all_of(&self, schema: &Schema) -> Result<Schema> {
        let mut acc = schema.clone();
        let Some(Value::Array(entries)) = acc.remove(ALL_OF_KEY) else {
            return Ok(acc);
        };
        for (idx, entry) in entries.iter().enumerate() {
            if entry == &Value::Bool(true) {
                continue;
            }
            let entry = to_schema(entry, &format!("#/allOf/{idx}"))?;
            acc = merge_schemas(&acc, &entry);
        }
        Ok(acc)
    }
}

/// Produces the working form value from form data and schema defaults.
pub trait FormMerger {
    fn merge_form_data_and_schema_defaults(
        &self,
        form_data: Option<&Value>,
        schema: &Schema,
    ) -> Result<Option<Value>>;
}

/// [`FormMerger`] backed by [`get_default_form_state`].
pub struct DefaultFormMerger<V: ?Sized> {
    validator: Arc<V>,
    root_schema: Schema,
    behavior: DefaultStateBehavior,
}

impl<V: Validator + ?Sized> DefaultFormMerger<V> {
    pub fn new(validator: Arc<V>, root_schema: Schema) -> Self {
        Self {
            validator,
            root_schema,
            behavior: DefaultStateBehavior::default(),
        }
    }

    pub fn with_behavior(mut self, behavior: DefaultStateBehavior) -> Self {
        self.behavior = behavior;
        self
    }
}

impl<V: Validator + ?Sized> FormMerger for DefaultFormMerger<V> {
    fn merge_form_data_and_schema_defaults(
        &self,
        form_data: Option<&Value>,
        schema: &Schema,
    ) -> Result<Option<Value>> {
        get_default_form_state(
            &*self.validator,
            &DefaultSchemaMerger,
            schema,
            form_data,
            &self.root_schema,
            &self.behavior,
        )
    }
}
