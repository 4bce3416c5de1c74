//! Default form state derivation.
//!
//! [`get_default_form_state`] walks a resolved schema and the existing form
//! data in lock-step. Every position ends up with the caller's data, the
//! schema's declared default, or a shape-appropriate empty value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    schema::{
        ADDITIONAL_ITEMS_KEY, ADDITIONAL_PROPERTIES_KEY, ANY_OF_KEY, CONST_KEY, ConcatArrays,
        DEFAULT_KEY, ENUM_KEY, ITEMS_KEY, MIN_ITEMS_KEY, ONE_OF_KEY, PROPERTIES_KEY, REF_KEY,
        Result, Schema, SchemaType, file::is_files_array, matching::get_matching_option_or_first,
        merge_defaults_with_form_data, merge_schema_objects, merge_schemas,
        merger::SchemaMerger, required_names, retrieve_schema, to_schema,
        types::get_simple_schema_type,
    },
    validator::Validator,
};

/// Tunables of the default state derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DefaultStateBehavior {
    /// Keep computed array defaults beyond the length of the form data.
    pub merge_extra_array_defaults: bool,
    /// Give required scalars without a default their type zero value
    /// (`""`, `0`, `false`, `null`) instead of leaving them undefined.
    pub populate_required_scalars: bool,
}

/// Derive the working form value for `schema` and `form_data`.
///
/// The schema is resolved first, defaults are computed from it, and the
/// result is merged with `form_data` so explicit data wins at every depth.
/// Undefined form data yields the computed defaults.
pub fn get_default_form_state<V, M>(
    validator: &V,
    merger: &M,
    schema: &Schema,
    form_data: Option<&Value>,
    root_schema: &Schema,
    behavior: &DefaultStateBehavior,
) -> Result<Option<Value>>
where
    V: Validator + ?Sized,
    M: SchemaMerger + ?Sized,
{
    let mut deriver = Deriver {
        validator,
        merger,
        root: root_schema,
        behavior,
        refs: Vec::new(),
    };
    let defaults = deriver.child(&Value::Object(schema.clone()), None, form_data, false)?;
    debug!("computed defaults: {defaults:?}");
    Ok(merge_defaults_with_form_data(
        defaults.as_ref(),
        form_data,
        behavior.merge_extra_array_defaults,
    ))
}

struct Deriver<'a, V: ?Sized, M: ?Sized> {
    validator: &'a V,
    merger: &'a M,
    root: &'a Schema,
    behavior: &'a DefaultStateBehavior,
    /// `$ref`s being expanded on the current path.
    refs: Vec<String>,
}

impl<V, M> Deriver<'_, V, M>
where
    V: Validator + ?Sized,
    M: SchemaMerger + ?Sized,
{
    /// Resolve an unresolved subschema and compute its defaults.
    ///
    /// A `$ref` already being expanded on this path is only followed while
    /// there is form data to drive it, which keeps recursive schemas finite.
    /// Where expansion stops the default handed down by the parent is kept.
    fn child(
        &mut self,
        definition: &Value,
        parent_default: Option<&Value>,
        form_data: Option<&Value>,
        required: bool,
    ) -> Result<Option<Value>> {
        let reference = definition.get(REF_KEY).and_then(Value::as_str);
        if let Some(reference) = reference {
            if form_data.is_none() && self.refs.iter().any(|r| r == reference) {
                trace!("stop expanding recursive {reference}");
                return Ok(parent_default.cloned());
            }
            self.refs.push(reference.to_string());
        }

        let result = retrieve_schema(self.validator, self.merger, definition, self.root, form_data)
            .and_then(|schema| self.compute(&schema, parent_default, form_data, required));

        if reference.is_some() {
            self.refs.pop();
        }
        result
    }

    fn compute(
        &mut self,
        schema: &Schema,
        parent_default: Option<&Value>,
        form_data: Option<&Value>,
        required: bool,
    ) -> Result<Option<Value>> {
        let defaults = match (parent_default, schema.get(DEFAULT_KEY)) {
            (Some(Value::Object(parent)), Some(Value::Object(own))) => Some(Value::Object(
                merge_schema_objects(parent, own, ConcatArrays::No),
            )),
            (_, Some(own)) => Some(own.clone()),
            (parent, None) => schema.get(CONST_KEY).or(parent).cloned(),
        };

        if !schema.contains_key(DEFAULT_KEY) {
            for key in [ONE_OF_KEY, ANY_OF_KEY] {
                if let Some(Value::Array(options)) = schema.get(key)
                    && !is_constant_options(options)
                {
                    return self.compute_union(schema, key, options, defaults, form_data, required);
                }
            }
        }

        match get_simple_schema_type(schema)? {
            SchemaType::Object => self.compute_object(schema, defaults, form_data).map(Some),
            SchemaType::Array => self.compute_array(schema, defaults, form_data).map(Some),
            ty => {
                if defaults.is_none() && required && self.behavior.populate_required_scalars {
                    return Ok(ty.zero_value());
                }
                Ok(defaults)
            }
        }
    }

    /// Merge the option matching the form data into the schema and compute
    /// defaults from the result.
    fn compute_union(
        &mut self,
        schema: &Schema,
        key: &str,
        options: &[Value],
        defaults: Option<Value>,
        form_data: Option<&Value>,
        required: bool,
    ) -> Result<Option<Value>> {
        let mut remaining = schema.clone();
        remaining.remove(key);
        if options.is_empty() {
            return self.compute(&remaining, defaults.as_ref(), form_data, required);
        }

        let idx = get_matching_option_or_first(self.validator, form_data, options, self.root);
        debug!("{key} selected option {idx}");
        let option = to_schema(&options[idx], &format!("#/{key}/{idx}"))?;
        let option = retrieve_schema(
            self.validator,
            self.merger,
            &Value::Object(option),
            self.root,
            form_data,
        )?;
        let merged = merge_schemas(&remaining, &option);
        self.compute(&merged, defaults.as_ref(), form_data, required)
    }

    fn compute_object(
        &mut self,
        schema: &Schema,
        defaults: Option<Value>,
        form_data: Option<&Value>,
    ) -> Result<Value> {
        let parent = defaults.as_ref().and_then(Value::as_object);
        let data = form_data.and_then(Value::as_object);
        let required = required_names(schema);
        let properties = schema.get(PROPERTIES_KEY).and_then(Value::as_object);

        let mut acc = Map::new();
        if let Some(properties) = properties {
            for (key, property) in properties {
                let value = self.child(
                    property,
                    parent.and_then(|p| p.get(key)),
                    data.and_then(|d| d.get(key)),
                    required.contains(&key.as_str()),
                )?;
                if let Some(value) = value {
                    acc.insert(key.clone(), value);
                }
            }
        }

        let is_declared = |key: &String| properties.is_some_and(|p| p.contains_key(key));
        let undeclared: Vec<&String> = parent
            .into_iter()
            .flat_map(|p| p.keys())
            .chain(data.into_iter().flat_map(|d| d.keys()))
            .filter(|key| !is_declared(key))
            .collect();

        match schema.get(ADDITIONAL_PROPERTIES_KEY) {
            Some(Value::Bool(false)) => {}
            Some(additional @ Value::Object(_)) => {
                for key in undeclared {
                    if acc.contains_key(key) {
                        continue;
                    }
                    let value = self.child(
                        additional,
                        parent.and_then(|p| p.get(key)),
                        data.and_then(|d| d.get(key)),
                        false,
                    )?;
                    if let Some(value) = value {
                        acc.insert(key.clone(), value);
                    }
                }
            }
            _ => {
                // Undeclared keys of a declared default are kept as written.
                if let Some(parent) = parent {
                    for key in undeclared {
                        if let Some(value) = parent.get(key) {
                            acc.entry(key.clone()).or_insert_with(|| value.clone());
                        }
                    }
                }
            }
        }

        Ok(Value::Object(acc))
    }

    fn compute_array(
        &mut self,
        schema: &Schema,
        defaults: Option<Value>,
        form_data: Option<&Value>,
    ) -> Result<Value> {
        let items = schema.get(ITEMS_KEY);
        let tuple = items.and_then(Value::as_array);
        let additional_items = schema.get(ADDITIONAL_ITEMS_KEY).filter(|v| v.is_object());
        let item_schema = |idx: usize| item_schema_at(items, additional_items, idx);

        let mut result: Vec<Value> = Vec::new();
        if let Some(Value::Array(default_items)) = &defaults {
            for (idx, item) in default_items.iter().enumerate() {
                let value = match item_schema(idx) {
                    Some(s) => self.child(s, Some(item), None, false)?,
                    None => None,
                };
                result.push(value.unwrap_or_else(|| item.clone()));
            }
        } else if let Some(tuple) = tuple
            && form_data.is_none()
        {
            for item in tuple {
                result.push(self.child(item, None, None, false)?.unwrap_or(Value::Null));
            }
        }

        if let Some(Value::Array(data_items)) = form_data {
            let mut computed = Vec::with_capacity(data_items.len());
            for (idx, item) in data_items.iter().enumerate() {
                let value = match item_schema(idx) {
                    Some(s) => self.child(s, result.get(idx), Some(item), false)?,
                    None => result.get(idx).cloned(),
                };
                computed.push(value.unwrap_or(Value::Null));
            }
            result = computed;
        }

        let min_items = schema
            .get(MIN_ITEMS_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        if min_items > result.len()
            && let Some(single @ Value::Object(_)) = items
            && !self.is_multi_select(schema, single)
            && !is_files_array(self.validator, self.merger, schema, self.root)?
        {
            let filler = self.child(single, None, None, false)?.unwrap_or(Value::Null);
            result.resize(min_items, filler);
        }

        Ok(Value::Array(result))
    }

    /// A `uniqueItems` array of enum values renders as a multi select and is
    /// never padded.
    fn is_multi_select(&self, schema: &Schema, items: &Value) -> bool {
        if schema.get("uniqueItems") != Some(&Value::Bool(true)) {
            return false;
        }
        retrieve_schema(self.validator, self.merger, items, self.root, None)
            .is_ok_and(|items| items.contains_key(ENUM_KEY))
    }
}

/// `oneOf`/`anyOf` lists made only of `const` schemas describe a select,
/// not alternative shapes.
fn is_constant_options(options: &[Value]) -> bool {
    !options.is_empty() && options.iter().all(|o| o.get(CONST_KEY).is_some())
}

/// Schema of the array element at `idx`: tuple position, then
/// `additionalItems`, or the single `items` schema.
fn item_schema_at<'a>(
    items: Option<&'a Value>,
    additional_items: Option<&'a Value>,
    idx: usize,
) -> Option<&'a Value> {
    match items {
        Some(Value::Array(tuple)) => tuple.get(idx).or(additional_items),
        Some(single @ Value::Object(_)) => Some(single),
        _ => None,
    }
}
