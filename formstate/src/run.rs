use std::path::Path;

use anyhow::{Context, bail};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    form::{errors::Errors, errors::group_errors, id::IdConfig},
    schema::{
        DefaultSchemaMerger, DefaultStateBehavior, Schema, get_default_form_state,
        resolve::find_schema_definition, retrieve_schema, to_schema,
    },
    validator::{FormValidator, JsonSchemaValidator, Validator},
};

/// On-disk formats for schemas, form data and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DataFormat {
    #[default]
    Json,
    Toml,
}

impl DataFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let ext = path
            .extension()
            .map(|s| format!("{}", s.display()))
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(DataFormat::Json),
            "toml" => Ok(DataFormat::Toml),
            _ => bail!("unsupported file extension: {ext}"),
        }
    }

    pub fn parse<T: DeserializeOwned>(self, content: &str) -> anyhow::Result<T> {
        Ok(match self {
            DataFormat::Json => serde_json::from_str(content)?,
            DataFormat::Toml => toml::from_str(content)?,
        })
    }

    pub fn render<T: Serialize>(self, value: &T) -> anyhow::Result<String> {
        Ok(match self {
            DataFormat::Json => serde_json::to_string_pretty(value)?,
            DataFormat::Toml => toml::to_string_pretty(value)?,
        })
    }
}

fn load<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let format = DataFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    format
        .parse(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read form data from a `.json` or `.toml` file.
pub fn load_form_data(path: impl AsRef<Path>) -> anyhow::Result<Value> {
    load(path.as_ref())
}

/// Read a root schema. Boolean schemas are turned into their object form.
pub fn load_schema(path: impl AsRef<Path>) -> anyhow::Result<Schema> {
    let path = path.as_ref();
    let value: Value = load(path)?;
    Ok(to_schema(&value, &path.display().to_string())?)
}

/// Settings of the command line tool, read from `formstate.toml` or
/// `formstate.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunConfig {
    pub ids: IdConfig,
    pub defaults: DefaultStateBehavior,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        load(path.as_ref())
    }
}

/// Default form state of `schema`, with `form_data` taking precedence.
pub fn derive_defaults<V: Validator + ?Sized>(
    validator: &V,
    schema: &Schema,
    form_data: Option<&Value>,
    behavior: &DefaultStateBehavior,
) -> anyhow::Result<Option<Value>> {
    let value = get_default_form_state(
        validator,
        &DefaultSchemaMerger,
        schema,
        form_data,
        schema,
        behavior,
    )?;
    Ok(value)
}

/// Default form state of a typed configuration.
///
/// The schema is generated with `schemars`, so field defaults come from the
/// type's `#[serde(default)]` values.
///
/// # Errors
///
/// Returns errors when the generated schema cannot be resolved.
pub fn defaults_for<C: JsonSchema>(
    validator: &impl Validator,
    form_data: Option<&Value>,
) -> anyhow::Result<Option<Value>> {
    let schema = schemars::schema_for!(C);
    let schema_json = serde_json::to_value(&schema)?;
    let schema = to_schema(&schema_json, "#")?;
    derive_defaults(validator, &schema, form_data, &DefaultStateBehavior::default())
}

/// Typed counterpart of [`defaults_for`]: fills the defaults in, then
/// deserializes the result.
pub fn load_typed<C: JsonSchema + DeserializeOwned>(
    validator: &impl Validator,
    form_data: Option<&Value>,
) -> anyhow::Result<C> {
    let value = defaults_for::<C>(validator, form_data)?.unwrap_or(Value::Null);
    serde_json::from_value(value).context("Failed to convert form state")
}

/// Resolve the subschema at `pointer` (`""` for the root) against `form_data`.
pub fn resolve_at<V: Validator + ?Sized>(
    validator: &V,
    schema: &Schema,
    pointer: &str,
    form_data: Option<&Value>,
) -> anyhow::Result<Schema> {
    let target = if pointer.is_empty() {
        Value::Object(schema.clone())
    } else {
        find_schema_definition(&format!("#{pointer}"), schema)
            .with_context(|| format!("No schema at {pointer}"))?
    };
    let resolved = retrieve_schema(validator, &DefaultSchemaMerger, &target, schema, form_data)?;
    debug!("resolved {pointer:?} to {} keywords", resolved.len());
    Ok(resolved)
}

/// Validate `form_data` with the bundled validator and group the errors.
pub fn validate(ids: IdConfig, schema: &Schema, form_data: Option<&Value>) -> Errors<String> {
    let validator = JsonSchemaValidator::new(ids);
    group_errors(validator.validate_form_data(schema, form_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestValidator;
    use serde_json::json;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DataFormat::from_path(Path::new("a/b.toml")).unwrap(),
            DataFormat::Toml
        );
        assert!(DataFormat::from_path(Path::new("a/b.yaml")).is_err());
    }

    #[test]
    fn test_run_config_defaults() {
        let config: RunConfig = DataFormat::Toml
            .parse("[defaults]\npopulate-required-scalars = true\n")
            .unwrap();
        assert!(config.defaults.populate_required_scalars);
        assert_eq!(config.ids, IdConfig::default());
    }

    #[test]
    fn test_resolve_at_pointer() {
        let schema = json!({
            "definitions": {"port": {"type": "integer", "default": 22}},
            "properties": {"port": {"$ref": "#/definitions/port"}}
        });
        let schema = schema.as_object().unwrap();
        let resolved = resolve_at(&TestValidator, schema, "/properties/port", None).unwrap();
        assert_eq!(Value::Object(resolved), json!({"type": "integer", "default": 22}));
        assert!(resolve_at(&TestValidator, schema, "/properties/missing", None).is_err());
    }

    #[test]
    fn test_render_toml() {
        let out = DataFormat::Toml.render(&json!({"a": 1})).unwrap();
        assert_eq!(out.trim(), "a = 1");
    }
}
