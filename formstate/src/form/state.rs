//! Form controller.
//!
//! [`FormState`] owns the working form value and its grouped errors. It is a
//! plain value with synchronous methods: the rendering layer calls them and
//! re-reads the state afterwards.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    form::{
        config::FieldConfig,
        errors::{Errors, group_errors},
        id::{IdConfig, PathSegment},
        key_validation::additional_property_key_validation_schema,
    },
    schema::{DefaultFormMerger, FormMerger, Result, Schema},
    validator::{
        AdditionalPropertyKeyError, AdditionalPropertyKeyValidator, FieldError, FormValidator,
        ValidationError,
    },
};

/// Errors a form starts with.
#[derive(Debug, Clone)]
pub enum InitialErrors<E> {
    /// A flat list, grouped by instance ID on construction.
    List(Vec<ValidationError<E>>),
    /// Errors already grouped.
    Grouped(Errors<E>),
}

impl<E> From<Vec<ValidationError<E>>> for InitialErrors<E> {
    fn from(value: Vec<ValidationError<E>>) -> Self {
        InitialErrors::List(value)
    }
}

impl<E> From<Errors<E>> for InitialErrors<E> {
    fn from(value: Errors<E>) -> Self {
        InitialErrors::Grouped(value)
    }
}

impl<E> From<InitialErrors<E>> for Errors<E> {
    fn from(value: InitialErrors<E>) -> Self {
        match value {
            InitialErrors::List(list) => group_errors(list),
            InitialErrors::Grouped(grouped) => grouped,
        }
    }
}

/// Construction parameters of a [`FormState`].
pub struct FormOptions<V: ?Sized, E> {
    pub validator: Arc<V>,
    pub schema: Schema,
    /// Defaults to a [`DefaultFormMerger`] over `validator` and `schema`.
    pub merger: Option<Box<dyn FormMerger>>,
    pub ids: IdConfig,
    pub initial_value: Option<Value>,
    pub initial_errors: Option<InitialErrors<E>>,
    pub additional_property_key_validator: Option<Box<dyn AdditionalPropertyKeyValidator>>,
}

impl<V: ?Sized, E> FormOptions<V, E> {
    pub fn new(validator: Arc<V>, schema: Schema) -> Self {
        Self {
            validator,
            schema,
            merger: None,
            ids: IdConfig::default(),
            initial_value: None,
            initial_errors: None,
            additional_property_key_validator: None,
        }
    }

    pub fn with_merger(mut self, merger: impl FormMerger + 'static) -> Self {
        self.merger = Some(Box::new(merger));
        self
    }

    pub fn with_ids(mut self, ids: IdConfig) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }

    pub fn with_initial_errors(mut self, errors: impl Into<InitialErrors<E>>) -> Self {
        self.initial_errors = Some(errors.into());
        self
    }

    /// Validate user typed additional property keys. Also forbids the ID
    /// separators in such keys during form validation.
    pub fn with_additional_property_key_validator(
        mut self,
        validator: impl AdditionalPropertyKeyValidator + 'static,
    ) -> Self {
        self.additional_property_key_validator = Some(Box::new(validator));
        self
    }
}

/// Result of [`FormState::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<E> {
    /// The submitted value passed validation.
    Valid(Option<Value>),
    /// Validation failed; the same errors are now stored on the form.
    Invalid(Errors<E>),
}

pub struct FormState<V: ?Sized, E> {
    validator: Arc<V>,
    schema: Schema,
    validation_schema: Schema,
    merger: Box<dyn FormMerger>,
    ids: IdConfig,
    initial_value: Option<Value>,
    key_validator: Option<Box<dyn AdditionalPropertyKeyValidator>>,

    value: Option<Value>,
    errors: Errors<E>,
    is_submitted: bool,
    is_changed: bool,
}

impl<V, E> FormState<V, E>
where
    V: FormValidator<E> + ?Sized + 'static,
{
    /// Build the form and derive its initial value from the initial value and
    /// the schema defaults.
    pub fn new(options: FormOptions<V, E>) -> Result<Self> {
        let FormOptions {
            validator,
            schema,
            merger,
            ids,
            initial_value,
            initial_errors,
            additional_property_key_validator,
        } = options;

        let merger = merger.unwrap_or_else(|| {
            let merger = DefaultFormMerger::new(validator.clone(), schema.clone());
            Box::new(merger) as Box<dyn FormMerger>
        });
        let value = merger.merge_form_data_and_schema_defaults(initial_value.as_ref(), &schema)?;
        let validation_schema = if additional_property_key_validator.is_some() {
            additional_property_key_validation_schema(&schema, &ids.separators())
        } else {
            schema.clone()
        };

        Ok(Self {
            validator,
            schema,
            validation_schema,
            merger,
            ids,
            initial_value,
            key_validator: additional_property_key_validator,
            value,
            errors: initial_errors.map(Errors::from).unwrap_or_default(),
            is_submitted: false,
            is_changed: false,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn ids(&self) -> &IdConfig {
        &self.ids
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Direct access to the working value. Marks the form as changed.
    pub fn value_mut(&mut self) -> &mut Option<Value> {
        self.is_changed = true;
        &mut self.value
    }

    /// Replace the value; schema defaults are filled in again.
    ///
    /// A programmatic replacement is not a user edit and leaves
    /// [`Self::is_changed`] alone.
    pub fn set_value(&mut self, value: Option<Value>) -> Result<()> {
        self.value = self
            .merger
            .merge_form_data_and_schema_defaults(value.as_ref(), &self.schema)?;
        Ok(())
    }

    pub fn errors(&self) -> &Errors<E> {
        &self.errors
    }

    pub fn set_errors(&mut self, errors: Errors<E>) {
        self.errors = errors;
    }

    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    pub fn is_changed(&self) -> bool {
        self.is_changed
    }

    pub fn set_changed(&mut self, changed: bool) {
        self.is_changed = changed;
    }

    /// Validate the current value without touching the stored errors.
    pub fn validate(&self) -> Errors<E> {
        group_errors(
            self.validator
                .validate_form_data(&self.validation_schema, self.value.as_ref()),
        )
    }

    /// Validate the current value and store the result.
    pub fn submit(&mut self) -> SubmitOutcome<E>
    where
        E: Clone,
    {
        self.is_submitted = true;
        self.errors = self.validate();
        if self.errors.is_empty() {
            debug!("form submitted");
            self.is_changed = false;
            return SubmitOutcome::Valid(self.value.clone());
        }
        debug!("form submit rejected: {} invalid fields", self.errors.len());
        SubmitOutcome::Invalid(self.errors.clone())
    }

    /// Back to the initial value, without errors.
    pub fn reset(&mut self) -> Result<()> {
        self.is_submitted = false;
        self.is_changed = false;
        self.errors.clear();
        self.value = self
            .merger
            .merge_form_data_and_schema_defaults(self.initial_value.as_ref(), &self.schema)?;
        Ok(())
    }

    /// Replace the errors of the instance at `path` with what `update`
    /// returns for the current ones.
    pub fn update_errors_by_path<F>(&mut self, path: &[PathSegment], update: F)
    where
        F: FnOnce(&[ValidationError<E>]) -> Vec<FieldError<E>>,
    {
        let instance_id = self.ids.id(path);
        let current = self
            .errors
            .get(&instance_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let updated = update(current)
            .into_iter()
            .map(|e| e.with_instance_id(instance_id.clone()))
            .collect();
        self.errors.insert(instance_id, updated);
    }

    /// Check a user typed additional property key.
    ///
    /// The field's errors are replaced by the validator messages. Without a
    /// key validator every key is accepted.
    pub fn validate_additional_property_key(&mut self, config: &FieldConfig, key: &str) -> bool
    where
        E: From<AdditionalPropertyKeyError>,
    {
        let Some(validator) = &self.key_validator else {
            return true;
        };
        let messages = validator.validate_additional_property_key(key);
        let valid = messages.is_empty();
        let errors = messages
            .into_iter()
            .map(|message| ValidationError {
                instance_id: config.id.clone(),
                property_title: config.title.clone(),
                message,
                error: E::from(AdditionalPropertyKeyError),
            })
            .collect();
        self.errors.insert(config.id.clone(), errors);
        valid
    }
}
