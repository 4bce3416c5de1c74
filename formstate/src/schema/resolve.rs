//! Schema resolution.
//!
//! [`retrieve_schema`] turns a schema fragment into a self-contained schema
//! for the given form data: `$ref` is dereferenced, `allOf` is folded,
//! `if`/`then`/`else` picks its branch and `dependencies` triggered by the
//! form data are merged in. The steps repeat until none of these keywords is
//! left.

use serde_json::Value;

use crate::{
    schema::{
        ALL_OF_KEY, DEPENDENCIES_KEY, ELSE_KEY, ID_KEY, IF_KEY, ONE_OF_KEY, REF_KEY, REQUIRED_KEY,
        Result, Schema, SchemaError, THEN_KEY, merge_schemas, merger::SchemaMerger,
    },
    validator::Validator,
};

/// Resolve `schema` against `root_schema` and the current form data.
///
/// Boolean schemas resolve to the empty schema `{}`.
///
/// # Errors
///
/// - [`SchemaError::CyclicReference`] when a `$ref` chain loops.
/// - [`SchemaError::UnresolvedReference`] when a `$ref` target is missing.
pub fn retrieve_schema<V, M>(
    validator: &V,
    merger: &M,
    schema: &Value,
    root_schema: &Schema,
    form_data: Option<&Value>,
) -> Result<Schema>
where
    V: Validator + ?Sized,
    M: SchemaMerger + ?Sized,
{
    let Value::Object(schema) = schema else {
        return Ok(Schema::new());
    };
    let mut resolver = Resolver {
        validator,
        merger,
        root: root_schema,
        form_data,
        chain: Vec::new(),
    };
    resolver.resolve(schema.clone())
}

struct Resolver<'a, V: ?Sized, M: ?Sized> {
    validator: &'a V,
    merger: &'a M,
    root: &'a Schema,
    form_data: Option<&'a Value>,
    /// `$ref` targets on the current resolution chain.
    chain: Vec<String>,
}

impl<V, M> Resolver<'_, V, M>
where
    V: Validator + ?Sized,
    M: SchemaMerger + ?Sized,
{
    fn resolve(&mut self, mut schema: Schema) -> Result<Schema> {
        loop {
            if let Some(reference) = schema.get(REF_KEY).and_then(Value::as_str) {
                let reference = reference.to_string();
                schema = self.resolve_reference(reference, schema)?;
                continue;
            }
            if schema.contains_key(ALL_OF_KEY) {
                schema = self.resolve_all_of(schema)?;
                continue;
            }
            if schema.contains_key(IF_KEY) {
                schema = self.resolve_condition(schema)?;
                continue;
            }
            if schema.contains_key(DEPENDENCIES_KEY) {
                schema = self.resolve_dependencies(schema)?;
                continue;
            }
            return Ok(schema);
        }
    }

    fn resolve_reference(&mut self, reference: String, mut schema: Schema) -> Result<Schema> {
        if self.chain.contains(&reference) {
            let mut chain = self.chain.clone();
            chain.push(reference.clone());
            return Err(SchemaError::CyclicReference {
                reference,
                chain: chain.join(" -> "),
            });
        }
        trace!("resolving {reference}");

        let target = match find_schema_definition(&reference, self.root)? {
            Value::Object(target) => target,
            _ => Schema::new(),
        };
        schema.remove(REF_KEY);
        let merged = if schema.is_empty() {
            target
        } else {
            merge_schemas(&target, &schema)
        };

        self.chain.push(reference);
        let resolved = self.resolve(merged);
        self.chain.pop();
        resolved
    }

    fn resolve_all_of(&mut self, mut schema: Schema) -> Result<Schema> {
        let Some(entries) = schema.remove(ALL_OF_KEY) else {
            return Ok(schema);
        };
        let Value::Array(entries) = entries else {
            warn!("ignoring non-array allOf: {entries}");
            return Ok(schema);
        };
        let mut resolved = Vec::with_capacity(entries.len());
        for entry in entries {
            resolved.push(match entry {
                Value::Object(entry) => Value::Object(self.resolve(entry)?),
                other => other,
            });
        }
        schema.insert(ALL_OF_KEY.to_string(), Value::Array(resolved));
        self.merger.merge_all_of(&schema)
    }

    fn resolve_condition(&mut self, mut schema: Schema) -> Result<Schema> {
        let condition = schema.remove(IF_KEY).unwrap_or(Value::Bool(true));
        let then_branch = schema.remove(THEN_KEY);
        let else_branch = schema.remove(ELSE_KEY);

        let valid = self.validator.is_valid(&condition, self.root, self.form_data);
        debug!("if condition evaluated to {valid}");

        match if valid { then_branch } else { else_branch } {
            Some(Value::Object(branch)) => {
                let branch = self.resolve(branch)?;
                Ok(merge_schemas(&schema, &branch))
            }
            _ => Ok(schema),
        }
    }

    fn resolve_dependencies(&mut self, mut schema: Schema) -> Result<Schema> {
        let Some(Value::Object(dependencies)) = schema.remove(DEPENDENCIES_KEY) else {
            return Ok(schema);
        };
        let Some(Value::Object(data)) = self.form_data else {
            return Ok(schema);
        };

        for (key, dependency) in dependencies {
            if !data.contains_key(&key) {
                continue;
            }
            debug!("applying dependency on {key}");
            match dependency {
                Value::Array(names) => {
                    let mut required = Schema::new();
                    required.insert(REQUIRED_KEY.to_string(), Value::Array(names));
                    schema = merge_schemas(&schema, &required);
                }
                Value::Object(dependent) => {
                    let dependent = self.resolve_dependent_one_of(dependent)?;
                    let dependent = self.resolve(dependent)?;
                    schema = merge_schemas(&schema, &dependent);
                }
                _ => {}
            }
        }
        Ok(schema)
    }

    /// Replace a dependent schema's `oneOf` by the first branch valid
    /// against the form data.
    fn resolve_dependent_one_of(&mut self, mut dependent: Schema) -> Result<Schema> {
        let Some(Value::Array(options)) = dependent.remove(ONE_OF_KEY) else {
            return Ok(dependent);
        };
        let matching = options
            .into_iter()
            .find(|option| self.validator.is_valid(option, self.root, self.form_data));
        match matching {
            Some(Value::Object(option)) => {
                let option = self.resolve(option)?;
                Ok(merge_schemas(&dependent, &option))
            }
            _ => Ok(dependent),
        }
    }
}

/// Look up the schema a `$ref` points to.
///
/// Supported forms: `#` (the root itself), JSON pointers `#/...` with
/// `~0`/`~1` escapes and percent-encoding, and plain `$id` values declared
/// anywhere in the root schema.
pub fn find_schema_definition(reference: &str, root_schema: &Schema) -> Result<Value> {
    let not_found = || SchemaError::UnresolvedReference(reference.to_string());

    let Some(fragment) = reference.strip_prefix('#') else {
        return find_by_id(root_schema, reference).ok_or_else(not_found);
    };
    let pointer = urlencoding::decode(fragment).map_err(|_| not_found())?;
    if pointer.is_empty() {
        return Ok(Value::Object(root_schema.clone()));
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return find_by_id(root_schema, reference).ok_or_else(not_found);
    };
    // 根是 Map，首段单独取，其余交给 Value::pointer
    let (first, tail) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let first = first.replace("~1", "/").replace("~0", "~");
    root_schema
        .get(&first)
        .and_then(|value| value.pointer(tail))
        .cloned()
        .ok_or_else(not_found)
}

fn find_by_id(schema: &Schema, id: &str) -> Option<Value> {
    if schema.get(ID_KEY).and_then(Value::as_str) == Some(id) {
        return Some(Value::Object(schema.clone()));
    }
    schema.values().find_map(|value| find_value_by_id(value, id))
}

fn find_value_by_id(value: &Value, id: &str) -> Option<Value> {
    match value {
        Value::Object(map) => find_by_id(map, id),
        Value::Array(items) => items.iter().find_map(|item| find_value_by_id(item, id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schema::DefaultSchemaMerger, testing::TestValidator};
    use serde_json::json;

    fn root(v: Value) -> Schema {
        v.as_object().cloned().unwrap()
    }

    fn retrieve(schema: Value, root_schema: &Schema, data: Option<&Value>) -> Result<Value> {
        retrieve_schema(&TestValidator, &DefaultSchemaMerger, &schema, root_schema, data)
            .map(Value::Object)
    }

    #[test]
    fn test_boolean_schema_resolves_to_empty() {
        let r = root(json!({}));
        assert_eq!(retrieve(json!(true), &r, None).unwrap(), json!({}));
        assert_eq!(retrieve(json!(false), &r, None).unwrap(), json!({}));
    }

    #[test]
    fn test_ref_with_siblings() {
        let r = root(json!({
            "$defs": {"name": {"type": "string", "title": "Name"}}
        }));
        let resolved = retrieve(json!({"$ref": "#/$defs/name", "title": "Override"}), &r, None);
        assert_eq!(
            resolved.unwrap(),
            json!({"type": "string", "title": "Override"})
        );
    }

    #[test]
    fn test_ref_chain_into_all_of() {
        let r = root(json!({
            "definitions": {
                "a": {"$ref": "#/definitions/b"},
                "b": {"allOf": [{"type": "object"}, {"required": ["x"]}]}
            }
        }));
        let resolved = retrieve(json!({"$ref": "#/definitions/a"}), &r, None).unwrap();
        assert_eq!(resolved, json!({"type": "object", "required": ["x"]}));
    }

    #[test]
    fn test_ref_by_id_and_escapes() {
        let r = root(json!({
            "$defs": {
                "a/b": {"type": "number"},
                "with space": {"type": "boolean"},
                "named": {"$id": "urn:named", "type": "string"}
            }
        }));
        assert_eq!(
            retrieve(json!({"$ref": "#/$defs/a~1b"}), &r, None).unwrap(),
            json!({"type": "number"})
        );
        assert_eq!(
            retrieve(json!({"$ref": "#/$defs/with%20space"}), &r, None).unwrap(),
            json!({"type": "boolean"})
        );
        assert_eq!(
            retrieve(json!({"$ref": "urn:named"}), &r, None).unwrap(),
            json!({"$id": "urn:named", "type": "string"})
        );
    }

    #[test]
    fn test_pointer_forms() {
        let r = root(json!({
            "title": "Board",
            "$defs": {"pair": {"items": [{"type": "string"}, {"type": "integer"}]}}
        }));
        assert_eq!(find_schema_definition("#", &r).unwrap()["title"], "Board");
        assert_eq!(
            find_schema_definition("#/$defs/pair/items/1", &r).unwrap(),
            json!({"type": "integer"})
        );
        assert_eq!(
            find_schema_definition("#/$defs/%FF", &r).unwrap_err(),
            SchemaError::UnresolvedReference("#/$defs/%FF".into())
        );
    }

    #[test]
    fn test_cyclic_reference() {
        let r = root(json!({
            "$defs": {
                "a": {"$ref": "#/$defs/b"},
                "b": {"$ref": "#/$defs/a"}
            }
        }));
        let err = retrieve(json!({"$ref": "#/$defs/a"}), &r, None).unwrap_err();
        assert_eq!(
            err,
            SchemaError::CyclicReference {
                reference: "#/$defs/a".into(),
                chain: "#/$defs/a -> #/$defs/b -> #/$defs/a".into(),
            }
        );
    }

    #[test]
    fn test_same_ref_twice_in_all_of_is_not_a_cycle() {
        let r = root(json!({"$defs": {"s": {"type": "string"}}}));
        let resolved = retrieve(
            json!({"allOf": [{"$ref": "#/$defs/s"}, {"$ref": "#/$defs/s"}]}),
            &r,
            None,
        );
        assert_eq!(resolved.unwrap(), json!({"type": "string"}));
    }

    #[test]
    fn test_unresolved_reference() {
        let r = root(json!({}));
        let err = retrieve(json!({"$ref": "#/$defs/missing"}), &r, None).unwrap_err();
        assert_eq!(err, SchemaError::UnresolvedReference("#/$defs/missing".into()));
    }

    #[test]
    fn test_if_then_else() {
        let r = root(json!({}));
        let schema = json!({
            "type": "object",
            "properties": {"kind": {"type": "string"}},
            "if": {"properties": {"kind": {"const": "a"}}},
            "then": {"properties": {"a": {"type": "string"}}},
            "else": {"properties": {"b": {"type": "number"}}}
        });
        let then = retrieve(schema.clone(), &r, Some(&json!({"kind": "a"}))).unwrap();
        assert!(then["properties"].get("a").is_some());
        assert!(then.get("if").is_none());

        let otherwise = retrieve(schema, &r, Some(&json!({"kind": "z"}))).unwrap();
        assert!(otherwise["properties"].get("b").is_some());
        assert!(otherwise["properties"].get("a").is_none());
    }

    #[test]
    fn test_if_without_branch() {
        let r = root(json!({}));
        let schema = json!({"type": "object", "if": {"required": ["x"]}, "then": {"title": "has x"}});
        let resolved = retrieve(schema, &r, Some(&json!({}))).unwrap();
        assert_eq!(resolved, json!({"type": "object"}));
    }

    #[test]
    fn test_dependencies() {
        let r = root(json!({}));
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}, "card": {"type": "number"}},
            "dependencies": {
                "card": {"properties": {"billing": {"type": "string"}}, "required": ["billing"]},
                "name": ["card"]
            }
        });
        let resolved = retrieve(schema.clone(), &r, Some(&json!({"card": 1}))).unwrap();
        assert!(resolved["properties"].get("billing").is_some());
        assert_eq!(resolved["required"], json!(["billing"]));

        let resolved = retrieve(schema.clone(), &r, Some(&json!({"name": "x"}))).unwrap();
        assert!(resolved["properties"].get("billing").is_none());
        assert_eq!(resolved["required"], json!(["card"]));

        let resolved = retrieve(schema, &r, None).unwrap();
        assert!(resolved.get("dependencies").is_none());
    }

    #[test]
    fn test_dependency_one_of() {
        let r = root(json!({}));
        let schema = json!({
            "type": "object",
            "properties": {"kind": {"enum": ["a", "b"]}},
            "dependencies": {
                "kind": {
                    "oneOf": [
                        {"properties": {"kind": {"const": "a"}, "x": {"type": "string"}}},
                        {"properties": {"kind": {"const": "b"}, "y": {"type": "number"}}}
                    ]
                }
            }
        });
        let resolved = retrieve(schema, &r, Some(&json!({"kind": "b"}))).unwrap();
        assert!(resolved["properties"].get("y").is_some());
        assert!(resolved["properties"].get("x").is_none());
        assert_eq!(resolved["properties"]["kind"], json!({"enum": ["a", "b"], "const": "b"}));
    }
}
