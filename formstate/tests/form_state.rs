use std::sync::Arc;

use formstate::{
    DefaultStateBehavior, FormOptions, FormState, JsonSchemaValidator, Schema, SubmitOutcome,
    Validator,
    form::{KeyedArray, TrackedArray},
    get_default_form_state,
    run::{defaults_for, load_form_data, load_typed},
    schema::DefaultSchemaMerger,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

fn board_schema() -> Schema {
    json!({
        "type": "object",
        "definitions": {
            "serial": {
                "type": "object",
                "properties": {
                    "port": {"type": "string", "default": "/dev/ttyUSB0"},
                    "baud": {"type": "integer", "default": 115200}
                },
                "required": ["port"]
            }
        },
        "properties": {
            "name": {"type": "string", "minLength": 1},
            "serial": {"$ref": "#/definitions/serial"},
            "boot": {
                "type": "string",
                "enum": ["uboot", "qemu"],
                "default": "qemu"
            },
            "cmdline": {"type": "array", "items": {"type": "string"}, "minItems": 1}
        },
        "required": ["name"],
        "if": {"properties": {"boot": {"const": "uboot"}}},
        "then": {"properties": {"dtb": {"type": "string", "default": "board.dtb"}}}
    })
    .as_object()
    .unwrap()
    .clone()
}

#[test]
fn test_form_lifecycle() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut form = FormState::<_, String>::new(
        FormOptions::new(Arc::new(JsonSchemaValidator::default()), board_schema())
            .with_initial_value(json!({"boot": "uboot"})),
    )
    .unwrap();

    assert_eq!(
        form.value(),
        Some(&json!({
            "boot": "uboot",
            "serial": {"port": "/dev/ttyUSB0", "baud": 115200},
            "cmdline": [null],
            "dtb": "board.dtb"
        }))
    );

    let SubmitOutcome::Invalid(errors) = form.submit() else {
        panic!("name is missing");
    };
    assert!(errors.contains_key("root.name"));
    assert!(errors.contains_key("root.cmdline.0"));

    let mut value = form.value().cloned().unwrap();
    value["name"] = json!("rk3588");
    value["cmdline"] = json!(["console=ttyS2"]);
    form.set_value(Some(value)).unwrap();

    match form.submit() {
        SubmitOutcome::Valid(Some(value)) => assert_eq!(value["name"], "rk3588"),
        other => panic!("unexpected {other:?}"),
    }

    form.reset().unwrap();
    assert_eq!(form.value().unwrap()["boot"], "uboot");
    assert!(form.value().unwrap().get("name").is_none());
}

#[test]
fn test_keyed_cmdline() {
    let form = FormState::<_, String>::new(FormOptions::new(
        Arc::new(JsonSchemaValidator::default()),
        board_schema(),
    ))
    .unwrap();
    let items = form.value().unwrap()["cmdline"]
        .as_array()
        .cloned()
        .unwrap();
    let mut cmdline = TrackedArray::new(items);
    let mut keys = KeyedArray::new();

    keys.push(&mut cmdline, json!("quiet"));
    keys.swap(&mut cmdline, 0, 1);
    assert_eq!(keys.observe(Some(&cmdline)), &[1, 0]);
    assert_eq!(cmdline.items()[0], json!("quiet"));
}

#[test]
fn test_ref_unions_and_recursive_defaults() {
    let schema = json!({
        "definitions": {
            "uboot": {"properties": {"uboot": {"type": "string"}, "env": {"default": "bootcmd"}}},
            "qemu": {"properties": {"qemu": {"type": "string"}, "smp": {"default": 2}}},
            "stage": {
                "type": "object",
                "properties": {"name": {"type": "string"}, "next": {"$ref": "#/definitions/stage"}}
            }
        },
        "type": "object",
        "properties": {
            "runner": {
                "type": "object",
                "oneOf": [{"$ref": "#/definitions/uboot"}, {"$ref": "#/definitions/qemu"}]
            },
            "boot": {
                "$ref": "#/definitions/stage",
                "default": {"name": "spl", "next": {"name": "kernel"}}
            }
        }
    })
    .as_object()
    .unwrap()
    .clone();
    let validator = JsonSchemaValidator::default();
    let data = json!({"runner": {"qemu": "virt"}});

    let value = get_default_form_state(
        &validator,
        &DefaultSchemaMerger,
        &schema,
        Some(&data),
        &schema,
        &DefaultStateBehavior::default(),
    )
    .unwrap();
    assert_eq!(
        value,
        Some(json!({
            "runner": {"qemu": "virt", "smp": 2},
            "boot": {"name": "spl", "next": {"name": "kernel"}}
        }))
    );

    let stage = json!({"$ref": "#/properties/boot"});
    assert!(validator.is_valid(&stage, &schema, Some(&json!({"next": {"name": "x"}}))));
    assert!(!validator.is_valid(&stage, &schema, Some(&json!({"next": {"name": 1}}))));
}

#[derive(Debug, JsonSchema, Serialize, Deserialize, PartialEq)]
#[serde(default)]
struct Qemu {
    machine: String,
    smp: u32,
    args: Vec<String>,
}

impl Default for Qemu {
    fn default() -> Self {
        Self {
            machine: "virt".to_string(),
            smp: 1,
            args: vec!["-nographic".to_string()],
        }
    }
}

#[test]
fn test_typed_defaults() {
    let validator = JsonSchemaValidator::default();
    let value = defaults_for::<Qemu>(&validator, Some(&json!({"smp": 4}))).unwrap();
    assert_eq!(
        value,
        Some(json!({"machine": "virt", "smp": 4, "args": ["-nographic"]}))
    );

    let qemu: Qemu = load_typed(&validator, None).unwrap();
    assert_eq!(qemu, Qemu::default());
}

#[test]
fn test_load_toml_form_data() {
    let path = std::env::temp_dir().join(format!("formstate-{}.toml", std::process::id()));
    std::fs::write(&path, "name = \"rk3588\"\n[serial]\nbaud = 1500000\n").unwrap();
    let data = load_form_data(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(
        data,
        json!({"name": "rk3588", "serial": {"baud": 1500000}})
    );
    assert!(matches!(data, Value::Object(_)));
}
