use serde_json::Value;

use crate::{
    schema::{
        DATA_URL_FORMAT, FORMAT_KEY, ITEMS_KEY, Result, Schema, TYPE_KEY, is_normal_array_items,
        merger::SchemaMerger, retrieve_schema,
    },
    validator::Validator,
};

/// A string schema holding a file encoded as a data URL.
pub fn is_file_schema(schema: &Schema) -> bool {
    schema.get(TYPE_KEY).and_then(Value::as_str) == Some("string")
        && schema.get(FORMAT_KEY).and_then(Value::as_str) == Some(DATA_URL_FORMAT)
}

/// An array whose single `items` schema resolves to a file schema.
///
/// Tuple `items` never count as a files array.
pub fn is_files_array<V, M>(
    validator: &V,
    merger: &M,
    schema: &Schema,
    root_schema: &Schema,
) -> Result<bool>
where
    V: Validator + ?Sized,
    M: SchemaMerger + ?Sized,
{
    let items = schema.get(ITEMS_KEY);
    let Some(items) = items.filter(|_| is_normal_array_items(items)) else {
        return Ok(false);
    };
    let items_schema = retrieve_schema(validator, merger, items, root_schema, None)?;
    Ok(is_file_schema(&items_schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schema::DefaultSchemaMerger, testing::TestValidator};
    use serde_json::json;

    #[test]
    fn test_files_array() {
        let root = json!({"$defs": {"file": {"type": "string", "format": "data-url"}}});
        let root = root.as_object().unwrap();

        let by_ref = json!({"type": "array", "items": {"$ref": "#/$defs/file"}});
        assert!(
            is_files_array(
                &TestValidator,
                &DefaultSchemaMerger,
                by_ref.as_object().unwrap(),
                root
            )
            .unwrap()
        );

        let tuple = json!({"type": "array", "items": [{"type": "string", "format": "data-url"}]});
        assert!(
            !is_files_array(
                &TestValidator,
                &DefaultSchemaMerger,
                tuple.as_object().unwrap(),
                root
            )
            .unwrap()
        );

        let strings = json!({"type": "array", "items": {"type": "string"}});
        assert!(
            !is_files_array(
                &TestValidator,
                &DefaultSchemaMerger,
                strings.as_object().unwrap(),
                root
            )
            .unwrap()
        );
    }
}
